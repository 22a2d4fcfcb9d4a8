use rush_types::{AccountId, Amount, CarId, PartId, PartType, SLOT_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Satellite role an operator can wire to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    Workshop,
    Leaderboard,
}

/// A committed state transition, as recorded in the journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposited { account: AccountId, amount: Amount },
    CarMinted { car_id: CarId, owner: AccountId, paid: Amount },
    PartMinted { part_id: PartId, owner: AccountId, part_type: PartType },
    PartEquipped { car_id: CarId, part_id: PartId, slot: usize },
    PartUnequipped { car_id: CarId, part_id: PartId },
    PartReplaced { car_id: CarId, old_part: PartId, new_part: PartId },
    PartTransferred { part_id: PartId, from: AccountId, to: AccountId },
    CarTransferred { car_id: CarId, from: AccountId, to: AccountId },
    PartApproved { part_id: PartId, approved: Option<AccountId> },
    CarApproved { car_id: CarId, approved: Option<AccountId> },
    OperatorApproval { owner: AccountId, operator: AccountId, approved: bool },
    CarListed { car_id: CarId, seller: AccountId, price: Amount, include_slots: [bool; SLOT_COUNT] },
    ListingCancelled { car_id: CarId },
    CarSold { car_id: CarId, seller: AccountId, buyer: AccountId, price: Amount, fee: Amount, parts: Vec<PartId> },
    CarRepaired { car_id: CarId, paid: Amount },
    WearApplied { car_id: CarId, amount: u8 },
    RaceRecorded { car_id: CarId, score: u64 },
    MintPriceSet { price: Amount },
    RepairPriceSet { price: Amount },
    ProtocolFeeSet { bps: u16 },
    AuthoritySet { role: Authority, account: Option<AccountId> },
    Withdrawn { to: AccountId, amount: Amount },
    OperatorTransferred { from: AccountId, to: AccountId },
    BaseUriSet { uri: String },
}

/// One hash-linked journal record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    #[serde(with = "hex_hash_opt")]
    pub prev_hash: Option<[u8; 32]>,
    #[serde(with = "hex_hash")]
    pub hash: [u8; 32],
    pub event: LedgerEvent,
}

#[derive(Serialize)]
struct EntryBody<'a> {
    seq: u64,
    prev_hash: Option<String>,
    event: &'a LedgerEvent,
}

impl JournalEntry {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    fn compute_hash(seq: u64, prev_hash: Option<[u8; 32]>, event: &LedgerEvent) -> LedgerResult<[u8; 32]> {
        let body = EntryBody {
            seq,
            prev_hash: prev_hash.map(hex::encode),
            event,
        };
        let encoded =
            serde_json::to_vec(&body).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"rush-journal-v1:");
        hasher.update(&encoded);
        Ok(*hasher.finalize().as_bytes())
    }
}

/// Append-only, hash-linked log of committed operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Build the next entry for `event` without appending it.
    ///
    /// Hashing is the only fallible step, so operations prepare their entry
    /// before mutating state and [`commit`](Self::commit) it afterwards.
    pub fn prepare(&self, event: LedgerEvent) -> LedgerResult<JournalEntry> {
        let seq = self.entries.len() as u64 + 1;
        let prev_hash = self.entries.last().map(|entry| entry.hash);
        let hash = JournalEntry::compute_hash(seq, prev_hash, &event)?;
        Ok(JournalEntry {
            seq,
            prev_hash,
            hash,
            event,
        })
    }

    pub fn commit(&mut self, entry: JournalEntry) {
        tracing::debug!(seq = entry.seq, hash = %entry.hash_hex(), "journal entry committed");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn head(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }

    /// Check sequence numbering, hash links, and entry hashes.
    pub fn validate(&self) -> ValidationReport {
        let mut violations = Vec::new();
        let mut hash_chain_valid = true;
        let mut sequence_monotonic = true;

        for (index, entry) in self.entries.iter().enumerate() {
            let expected_seq = index as u64 + 1;
            if entry.seq != expected_seq {
                sequence_monotonic = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", entry.seq),
                });
            }

            let expected_prev = index.checked_sub(1).map(|prev| self.entries[prev].hash);
            if entry.prev_hash != expected_prev {
                hash_chain_valid = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            if let Ok(computed) = JournalEntry::compute_hash(entry.seq, entry.prev_hash, &entry.event) {
                if computed != entry.hash {
                    hash_chain_valid = false;
                    violations.push(Violation {
                        seq: entry.seq,
                        kind: ViolationKind::HashMismatch,
                        description: "entry hash does not match computed".into(),
                    });
                }
            }
        }

        ValidationReport {
            entry_count: self.entries.len() as u64,
            hash_chain_valid,
            sequence_monotonic,
            violations,
        }
    }
}

/// Result of journal validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub entry_count: u64,
    pub hash_chain_valid: bool,
    pub sequence_monotonic: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    SequenceGap,
    HashChainBreak,
    HashMismatch,
}

mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32-byte hash"))
    }
}

mod hex_hash_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Option<[u8; 32]>, serializer: S) -> Result<S::Ok, S::Error> {
        match hash {
            Some(hash) => super::hex_hash::serialize(hash, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<[u8; 32]>, D::Error> {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("expected 32-byte hash"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(amount: Amount) -> LedgerEvent {
        LedgerEvent::Deposited {
            account: AccountId::from_label("alice"),
            amount,
        }
    }

    fn journal(n: u64) -> Journal {
        let mut journal = Journal::default();
        for i in 0..n {
            let entry = journal.prepare(deposit(u128::from(i) + 1)).unwrap();
            journal.commit(entry);
        }
        journal
    }

    #[test]
    fn entries_are_hash_linked() {
        let journal = journal(3);
        let entries = journal.entries();
        assert_eq!(entries[0].prev_hash, None);
        assert_eq!(entries[1].prev_hash, Some(entries[0].hash));
        assert_eq!(entries[2].seq, 3);
        assert!(journal.validate().is_valid());
    }

    #[test]
    fn prepare_does_not_append() {
        let journal = journal(1);
        let entry = journal.prepare(deposit(9)).unwrap();
        assert_eq!(entry.seq, 2);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn tampered_event_is_detected() {
        let mut journal = journal(3);
        journal.entries[1].event = deposit(1_000);
        let report = journal.validate();
        assert!(!report.hash_chain_valid);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::HashMismatch);
        assert_eq!(report.violations[0].seq, 2);
    }

    #[test]
    fn dropped_entry_breaks_sequence_and_chain() {
        let mut journal = journal(3);
        journal.entries.remove(1);
        let report = journal.validate();
        assert!(!report.sequence_monotonic);
        let kinds: Vec<ViolationKind> = report.violations.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::SequenceGap, ViolationKind::HashChainBreak]);
    }

    #[test]
    fn journal_round_trips_through_json() {
        let journal = journal(2);
        let json = serde_json::to_string(&journal).unwrap();
        assert!(json.contains(&journal.entries()[0].hash_hex()));
        let back: Journal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, journal);
        assert!(back.validate().is_valid());
    }
}
