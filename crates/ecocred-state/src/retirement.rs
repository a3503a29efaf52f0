use ecocred_core::constants::{MAX_CERTIFICATE_ID_BYTES, MAX_REASON_BYTES};
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::Retirement;
use ecocred_core::types::{Address, Amount, RetirementId};
use tracing::info;

use crate::staged::{Counter, StagedState};
use crate::token;
use crate::view::LedgerView;

/// Permanently burn `amount` of the caller's credits against a certificate.
pub fn retire_credits(
    st: &mut StagedState<'_>,
    retirer: &Address,
    amount: Amount,
    reason: &str,
    certificate_id: &str,
) -> Result<RetirementId, EcoCredError> {
    if amount == 0 {
        return Err(EcoCredError::InvalidArgument("retirement amount must be positive".into()));
    }
    if certificate_id.trim().is_empty() {
        return Err(EcoCredError::InvalidArgument("certificate id must not be empty".into()));
    }
    if certificate_id.len() > MAX_CERTIFICATE_ID_BYTES || reason.len() > MAX_REASON_BYTES {
        return Err(EcoCredError::InvalidArgument("reason or certificate id too long".into()));
    }

    token::burn(st, retirer, amount)?;

    let id = st.next_id(Counter::Retirement)?;
    st.put_retirement(&Retirement {
        id,
        retirer: *retirer,
        amount,
        reason: reason.to_string(),
        certificate_id: certificate_id.to_string(),
        retired_at: st.now(),
    })?;
    let by_user = st.retired_by(retirer)?.checked_add(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    st.put_retired_by(retirer, by_user)?;
    let total = st.retired_total()?.checked_add(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    st.put_retired_total(total)?;

    info!(retirement_id = id, %retirer, amount = %amount, certificate_id, "credits retired");
    st.emit(Event::CreditsRetired {
        retirement_id: id,
        retirer: *retirer,
        amount,
        reason: reason.to_string(),
        certificate_id: certificate_id.to_string(),
    });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use ecocred_core::transaction::Action;

    use super::*;
    use crate::testutil::{credits, Fixture};

    fn retire(amount: Amount, cert: &str) -> Action {
        Action::RetireCredits { amount, reason: "FY26 offset".into(), certificate_id: cert.into() }
    }

    #[test]
    fn retirement_burns_and_records() {
        let f = Fixture::new("retire");
        f.fund(f.company, credits(100));
        let r = f.apply(f.company, retire(credits(40), "CERT-001")).unwrap();
        assert_eq!(r.output.id(), Some(1));

        let db = &f.engine.db;
        assert_eq!(db.balance_of(&f.company).unwrap(), credits(60));
        assert_eq!(db.token_info().unwrap().total_supply, credits(60));
        assert_eq!(db.retired_by(&f.company).unwrap(), credits(40));
        assert_eq!(db.retired_total().unwrap(), credits(40));
        assert_eq!(db.retirement(1).unwrap().unwrap().certificate_id, "CERT-001");
        assert_eq!(r.events.last().unwrap().event.kind(), "CreditsRetired");
    }

    #[test]
    fn retirement_validation() {
        let f = Fixture::new("retire_invalid");
        f.fund(f.company, credits(1));
        assert!(matches!(f.apply(f.company, retire(0, "C")).unwrap_err(), EcoCredError::InvalidArgument(_)));
        assert!(matches!(f.apply(f.company, retire(1, " ")).unwrap_err(), EcoCredError::InvalidArgument(_)));
        assert!(matches!(
            f.apply(f.company, retire(credits(2), "C")).unwrap_err(),
            EcoCredError::InsufficientBalance { .. }
        ));
        // failed retirements consume no id
        assert_eq!(f.apply(f.company, retire(1, "C")).unwrap().output.id(), Some(1));
    }
}
