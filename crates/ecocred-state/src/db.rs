use std::path::Path;

use ecocred_core::error::EcoCredError;
use ecocred_core::event::EventEnvelope;
use ecocred_core::transaction::{Output, Receipt, Transaction};
use ecocred_core::types::{Address, Timestamp, TxId};

use crate::keys::{self, meta_names};
use crate::staged::StagedState;
use crate::view::{decode, StateRead};

/// Persistent ledger database backed by sled.
///
/// Named trees:
///   ledger: every ledger entity under prefix keyspaces (see `keys`), plus
///          id counters, the event journal and transaction receipts, so a
///            transaction commits as one batch
///   meta:   node-local bookkeeping outside the ledger (utf8 key → raw bytes)
pub struct StateDb {
    _db: sled::Db,
    ledger: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EcoCredError> {
        let db = sled::open(path).map_err(|e| EcoCredError::Storage(e.to_string()))?;
        let ledger = db.open_tree("ledger").map_err(|e| EcoCredError::Storage(e.to_string()))?;
        let meta = db.open_tree("meta").map_err(|e| EcoCredError::Storage(e.to_string()))?;
        Ok(Self { _db: db, ledger, meta })
    }

    // ── Commit ────────────────────────────────────────────────────────────────

    /// Persist a finished overlay as the next ledger transaction.
    ///
    /// Staged writes, the sequenced events, the receipt and the sequence
    /// counters go into a single `sled::Batch`. `tx` is `None` for genesis.
    pub fn commit(
        &self,
        staged: StagedState<'_>,
        tx: Option<&Transaction>,
        output: Output,
    ) -> Result<Receipt, EcoCredError> {
        let now = staged.now();
        let changes = staged.into_changes();

        let seq = self.tx_count()? + 1;
        let mut event_seq = self.event_count()?;

        let (tx_id, caller) = match tx {
            Some(tx) => (tx.id_at(seq), tx.caller),
            None => (genesis_tx_id(), Address::ZERO),
        };

        let mut batch = sled::Batch::default();
        for (key, value) in changes.writes {
            match value {
                Some(v) => batch.insert(key, v),
                None => batch.remove(key),
            }
        }

        let mut envelopes = Vec::with_capacity(changes.events.len());
        for event in changes.events {
            event_seq += 1;
            let env = EventEnvelope::new(event_seq, seq, now, event);
            let bytes = serde_json::to_vec(&env).map_err(|e| EcoCredError::Serialization(e.to_string()))?;
            batch.insert(keys::event(event_seq), bytes);
            envelopes.push(env);
        }

        let receipt = Receipt { tx_id, seq, caller, output, events: envelopes, applied_at: now };
        let bytes = serde_json::to_vec(&receipt).map_err(|e| EcoCredError::Serialization(e.to_string()))?;
        batch.insert(keys::receipt(seq), bytes);
        batch.insert(keys::tx_index(&tx_id), seq.to_be_bytes().to_vec());
        batch.insert(keys::meta(meta_names::TX_SEQ), seq.to_be_bytes().to_vec());
        batch.insert(keys::meta(meta_names::EVENT_SEQ), event_seq.to_be_bytes().to_vec());

        self.ledger.apply_batch(batch).map_err(|e| EcoCredError::Storage(e.to_string()))?;
        Ok(receipt)
    }

    // ── Journal ───────────────────────────────────────────────────────────────

    /// Number of committed transactions (genesis included).
    pub fn tx_count(&self) -> Result<u64, EcoCredError> {
        self.read_seq(meta_names::TX_SEQ)
    }

    /// Sequence number of the last committed event.
    pub fn event_count(&self) -> Result<u64, EcoCredError> {
        self.read_seq(meta_names::EVENT_SEQ)
    }

    fn read_seq(&self, name: &str) -> Result<u64, EcoCredError> {
        match self.get_raw(&keys::meta(name))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| EcoCredError::Serialization(format!("corrupt sequence {name}")))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// Up to `limit` events starting at sequence `from_seq`, in commit order.
    pub fn events_from(&self, from_seq: u64, limit: usize) -> Result<Vec<EventEnvelope>, EcoCredError> {
        let mut out = Vec::new();
        for item in self.ledger.range(keys::event(from_seq.max(1))..) {
            if out.len() >= limit {
                break;
            }
            let (key, value) = item.map_err(|e| EcoCredError::Storage(e.to_string()))?;
            if !key.starts_with(keys::EVENT) {
                break;
            }
            let env = serde_json::from_slice(&value).map_err(|e| EcoCredError::Serialization(e.to_string()))?;
            out.push(env);
        }
        Ok(out)
    }

    pub fn receipt(&self, seq: u64) -> Result<Option<Receipt>, EcoCredError> {
        match self.get_raw(&keys::receipt(seq))? {
            Some(bytes) => {
                let r = serde_json::from_slice(&bytes).map_err(|e| EcoCredError::Serialization(e.to_string()))?;
                Ok(Some(r))
            }
            None => Ok(None),
        }
    }

    pub fn receipt_by_tx(&self, tx_id: &TxId) -> Result<Option<Receipt>, EcoCredError> {
        match self.get_raw(&keys::tx_index(tx_id))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| EcoCredError::Serialization("corrupt tx index".into()))?;
                self.receipt(u64::from_be_bytes(arr))
            }
            None => Ok(None),
        }
    }

    /// Genesis time, if genesis has run.
    pub fn genesis_time(&self) -> Result<Option<Timestamp>, EcoCredError> {
        match self.get_raw(&keys::meta(meta_names::GENESIS))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Meta ──────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), EcoCredError> {
        self.meta
            .insert(key.as_bytes(), value)
            .map_err(|e| EcoCredError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, EcoCredError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| EcoCredError::Storage(e.to_string()))
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), EcoCredError> {
        self._db.flush().map_err(|e| EcoCredError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl StateRead for StateDb {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EcoCredError> {
        self.ledger
            .get(key)
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| EcoCredError::Storage(e.to_string()))
    }

    fn scan_raw(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EcoCredError> {
        let mut out = Vec::new();
        for item in self.ledger.scan_prefix(prefix) {
            let (k, v) = item.map_err(|e| EcoCredError::Storage(e.to_string()))?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }
}

fn genesis_tx_id() -> TxId {
    TxId::from_bytes(*blake3::hash(b"ecocred.genesis").as_bytes())
}
