//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `members` - Member records (key: member_id)
//! - `ledgers` - Per-member aggregates (key: member_id)
//! - `transactions` - Append-only entry log (key: length-prefixed member_id + timestamp + tx_id)
//! - `repairs` - Entries whose propagation may be incomplete (key: tx_id, value: member_id)

use crate::{
    error::{Error, Result},
    types::{Ledger, Transaction},
    Config,
};
use member_network::{Member, MemberId};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_MEMBERS: &str = "members";
const CF_LEDGERS: &str = "ledgers";
const CF_TRANSACTIONS: &str = "transactions";
const CF_REPAIRS: &str = "repairs";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-heavy transaction log
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_MEMBERS, Self::cf_options_members()),
            ColumnFamilyDescriptor::new(CF_LEDGERS, Self::cf_options_ledgers()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_transactions()),
            ColumnFamilyDescriptor::new(CF_REPAIRS, Self::cf_options_repairs()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_members() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_ledgers() -> Options {
        let mut opts = Options::default();
        // Ledgers are rewritten on every propagation step, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_transactions() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_repairs() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Member operations

    /// Put member record
    pub fn put_member(&self, member: &Member) -> Result<()> {
        let cf = self.cf_handle(CF_MEMBERS)?;
        let value = bincode::serialize(member)?;
        self.db.put_cf(cf, member.id.as_bytes(), &value)?;
        Ok(())
    }

    /// Get member record
    pub fn get_member(&self, id: &MemberId) -> Result<Option<Member>> {
        let cf = self.cf_handle(CF_MEMBERS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Load all member records (startup arena rebuild)
    pub fn load_members(&self) -> Result<Vec<Member>> {
        let cf = self.cf_handle(CF_MEMBERS)?;
        let mut members = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            members.push(bincode::deserialize(&value)?);
        }

        Ok(members)
    }

    /// Create a member, its zero ledger, and the refreshed parent record
    /// in one atomic batch; both or neither land on disk.
    pub fn create_member_atomic(
        &self,
        member: &Member,
        ledger: &Ledger,
        parent: Option<&Member>,
    ) -> Result<()> {
        let cf_members = self.cf_handle(CF_MEMBERS)?;
        let cf_ledgers = self.cf_handle(CF_LEDGERS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_members, member.id.as_bytes(), bincode::serialize(member)?);
        batch.put_cf(cf_ledgers, ledger.member_id.as_bytes(), bincode::serialize(ledger)?);

        if let Some(parent) = parent {
            batch.put_cf(cf_members, parent.id.as_bytes(), bincode::serialize(parent)?);
        }

        self.db.write(batch)?;

        tracing::debug!(member_id = %member.id, "Member and ledger persisted");
        Ok(())
    }

    // Ledger operations

    /// Put ledger
    pub fn put_ledger(&self, ledger: &Ledger) -> Result<()> {
        let cf = self.cf_handle(CF_LEDGERS)?;
        let value = bincode::serialize(ledger)?;
        self.db.put_cf(cf, ledger.member_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Get ledger (absent means zero-balance, never pledged)
    pub fn get_ledger(&self, id: &MemberId) -> Result<Option<Ledger>> {
        let cf = self.cf_handle(CF_LEDGERS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Transaction operations

    /// Append a transaction with its owner's updated ledger and a repair
    /// marker for this entry, all in one atomic batch.
    ///
    /// The marker is keyed by the entry's own id, so walks by the same
    /// member in flight at once each carry their own marker and clearing
    /// one cannot drop the evidence for another. A crash before the
    /// walk completes leaves the marker the reconciliation pass needs.
    pub fn apply_entry(&self, tx: &Transaction, ledger: &Ledger, mark_repair: bool) -> Result<()> {
        let cf_txs = self.cf_handle(CF_TRANSACTIONS)?;
        let cf_ledgers = self.cf_handle(CF_LEDGERS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_txs, Self::transaction_key(tx), bincode::serialize(tx)?);
        batch.put_cf(cf_ledgers, ledger.member_id.as_bytes(), bincode::serialize(ledger)?);

        if mark_repair {
            let cf_repairs = self.cf_handle(CF_REPAIRS)?;
            batch.put_cf(cf_repairs, tx.id.as_bytes(), tx.member_id.as_bytes());
        }

        self.db.write(batch)?;

        tracing::debug!(
            tx_id = %tx.id,
            member_id = %tx.member_id,
            amount = %tx.amount,
            "Transaction appended"
        );

        Ok(())
    }

    /// Get a member's transactions, ordered by timestamp
    pub fn transactions_for(&self, id: &MemberId) -> Result<Vec<Transaction>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let prefix = Self::member_prefix(id);

        let mut txs = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, &prefix) {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            txs.push(bincode::deserialize(&value)?);
        }

        Ok(txs)
    }

    /// Length-prefixed member id; no id can be a key prefix of another,
    /// whatever bytes the id contains
    fn member_prefix(id: &MemberId) -> Vec<u8> {
        let bytes = id.as_bytes();
        debug_assert!(bytes.len() <= u16::MAX as usize);
        let mut prefix = Vec::with_capacity(2 + bytes.len());
        prefix.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        prefix.extend_from_slice(bytes);
        prefix
    }

    fn transaction_key(tx: &Transaction) -> Vec<u8> {
        let mut key = Self::member_prefix(&tx.member_id);
        key.extend_from_slice(&tx.timestamp_nanos.to_be_bytes());
        key.extend_from_slice(tx.id.as_bytes());
        key
    }

    // Repair queue

    /// Record an entry whose ancestor chain may be stale
    pub fn enqueue_repair(&self, tx_id: &Uuid, origin: &MemberId) -> Result<()> {
        let cf = self.cf_handle(CF_REPAIRS)?;
        self.db.put_cf(cf, tx_id.as_bytes(), origin.as_bytes())?;
        Ok(())
    }

    /// Remove one entry's marker from the repair queue
    pub fn clear_repair(&self, tx_id: &Uuid) -> Result<()> {
        let cf = self.cf_handle(CF_REPAIRS)?;
        self.db.delete_cf(cf, tx_id.as_bytes())?;
        Ok(())
    }

    /// All entries pending repair, with the member that originated each
    pub fn pending_repairs(&self) -> Result<Vec<(Uuid, MemberId)>> {
        let cf = self.cf_handle(CF_REPAIRS)?;
        let mut pending = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let tx_id = Uuid::from_slice(&key)
                .map_err(|e| Error::Storage(format!("Invalid repair key: {}", e)))?;
            let origin = String::from_utf8(value.to_vec())
                .map_err(|e| Error::Storage(format!("Invalid repair value: {}", e)))?;
            pending.push((tx_id, MemberId::new(origin)));
        }

        Ok(pending)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish()
    }
}
