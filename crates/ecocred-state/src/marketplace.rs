//! Fixed-price credit listings paid in native currency.
//!
//! Listings do not escrow credits: the seller approves the marketplace
//! principal and the credits move at purchase time through `transfer_from`.

use ecocred_core::constants::{BPS_DENOMINATOR, CREDIT_UNIT};
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::{Listing, ListingStatus};
use ecocred_core::types::{Address, Amount, ListingId, Module};
use tracing::info;

use crate::staged::{Counter, StagedState};
use crate::token;
use crate::view::LedgerView;

/// Native cost of `amount` credits at `price_per_credit` per whole credit,
/// rounded up so a non-empty purchase never costs zero.
pub fn total_price(amount: Amount, price_per_credit: Amount) -> Result<Amount, EcoCredError> {
    amount
        .checked_mul(price_per_credit)
        .map(|v| v.div_ceil(CREDIT_UNIT))
        .ok_or(EcoCredError::ArithmeticOverflow)
}

pub fn create_listing(
    st: &mut StagedState<'_>,
    seller: &Address,
    amount: Amount,
    price_per_credit: Amount,
) -> Result<ListingId, EcoCredError> {
    if amount == 0 || price_per_credit == 0 {
        return Err(EcoCredError::InvalidArgument("amount and price must be positive".into()));
    }
    let market = Module::Marketplace.address();
    let allowance = st.allowance(seller, &market)?;
    if allowance < amount {
        return Err(EcoCredError::InsufficientAllowance { need: amount, have: allowance });
    }
    let balance = st.balance_of(seller)?;
    if balance < amount {
        return Err(EcoCredError::InsufficientBalance { need: amount, have: balance });
    }

    let id = st.next_id(Counter::Listing)?;
    st.put_listing(&Listing {
        id,
        seller: *seller,
        amount,
        remaining: amount,
        price_per_credit,
        status: ListingStatus::Active,
        created_at: st.now(),
    })?;
    st.emit(Event::ListingCreated { listing_id: id, seller: *seller, amount, price_per_credit });
    Ok(id)
}

/// Buy `amount` credits from a listing. Only the computed total is charged;
/// any excess in `payment` stays with the buyer.
pub fn purchase(
    st: &mut StagedState<'_>,
    buyer: &Address,
    listing_id: ListingId,
    amount: Amount,
    payment: Amount,
) -> Result<(), EcoCredError> {
    let mut listing = st.listing(listing_id)?.ok_or_else(|| EcoCredError::not_found("listing", listing_id))?;
    if listing.status != ListingStatus::Active {
        return Err(EcoCredError::NotActive(listing_id));
    }
    if amount == 0 || amount > listing.remaining {
        return Err(EcoCredError::InvalidArgument(format!(
            "amount must be between 1 and {} base units",
            listing.remaining
        )));
    }
    let total = total_price(amount, listing.price_per_credit)?;
    if payment < total {
        return Err(EcoCredError::InsufficientPayment { need: total, got: payment });
    }

    let config = st.config()?;
    let fee = total
        .checked_mul(config.platform_fee_bps as Amount)
        .ok_or(EcoCredError::ArithmeticOverflow)?
        / BPS_DENOMINATOR;
    let fee_recipient = match config.fee_recipient {
        Some(addr) => addr,
        None => st.token_info()?.owner,
    };

    token::debit_native(st, buyer, total)?;
    token::credit_native(st, &fee_recipient, fee)?;
    token::credit_native(st, &listing.seller, total - fee)?;
    token::transfer_from(st, &Module::Marketplace.address(), &listing.seller, buyer, amount)?;

    listing.remaining -= amount;
    if listing.remaining == 0 {
        listing.status = ListingStatus::Sold;
    }
    st.put_listing(&listing)?;
    info!(listing_id, %buyer, amount = %amount, total = %total, "listing purchase");
    st.emit(Event::PurchaseExecuted { listing_id, buyer: *buyer, amount, total_price: total });
    Ok(())
}

pub fn cancel_listing(st: &mut StagedState<'_>, caller: &Address, listing_id: ListingId) -> Result<(), EcoCredError> {
    let mut listing = st.listing(listing_id)?.ok_or_else(|| EcoCredError::not_found("listing", listing_id))?;
    if listing.seller != *caller {
        return Err(EcoCredError::Unauthorized(format!("{caller} is not the seller of listing {listing_id}")));
    }
    if listing.status != ListingStatus::Active {
        return Err(EcoCredError::NotActive(listing_id));
    }
    listing.status = ListingStatus::Cancelled;
    st.put_listing(&listing)?;
    st.emit(Event::ListingCancelled { listing_id });
    Ok(())
}
