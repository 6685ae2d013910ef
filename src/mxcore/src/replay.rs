//! Transaction replay: buffering a transaction's statements so it can be
//! re-executed against a freshly acquired backend connection if the
//! original backend fails mid-transaction, with each step's result
//! checksummed so divergence between the original and replayed execution
//! is detected rather than silently accepted.

use crate::error::{Error, Result};
use crate::protocol::mysql::constants::CommandCode;
use crate::protocol::mysql::packet::packet_reader::PacketReader;
use crate::protocol::mysql::packet::packet_writer::PacketWriter;

use std::hash::Hasher;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncWrite};
use twox_hash::XxHash64;

/// A 128-bit checksum over a backend reply, built from two independently
/// seeded 64-bit xxHash passes.
pub fn checksum(data: &[u8]) -> u128 {
    let mut lo = XxHash64::with_seed(0);
    lo.write(data);
    let mut hi = XxHash64::with_seed(0x9E37_79B9_7F4A_7C15);
    hi.write(data);
    ((hi.finish() as u128) << 64) | lo.finish() as u128
}

#[derive(Debug, Clone)]
pub struct LoggedStatement {
    pub statement: Vec<u8>,
    pub result_checksum: u128,
}

/// Holds the statements executed inside the current transaction along with
/// the checksum of each statement's result, up to `transaction_replay_max_size`
/// bytes of buffered statement text. Once the cap is exceeded replay is no
/// longer possible and the transaction must run to completion or fail
/// outright on backend loss.
#[derive(Debug)]
pub struct TransactionLog {
    entries: Vec<LoggedStatement>,
    buffered_bytes: usize,
    max_size: usize,
    capped: bool,
}

impl TransactionLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            buffered_bytes: 0,
            max_size,
            capped: false,
        }
    }

    pub fn begin(&mut self) {
        self.entries.clear();
        self.buffered_bytes = 0;
        self.capped = false;
    }

    /// Whether the log has exceeded its size cap and can no longer support
    /// a replay of this transaction.
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a statement and the checksum of the reply it produced. Once
    /// the running total of buffered statement bytes exceeds `max_size`,
    /// the log is marked capped and stops accepting further entries.
    pub fn record(&mut self, statement: &[u8], result_checksum: u128) {
        if self.capped {
            return;
        }
        if self.buffered_bytes + statement.len() > self.max_size {
            self.capped = true;
            self.entries.clear();
            self.buffered_bytes = 0;
            return;
        }
        self.buffered_bytes += statement.len();
        self.entries.push(LoggedStatement {
            statement: statement.to_vec(),
            result_checksum,
        });
    }

    pub fn statements(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|e| e.statement.as_slice())
    }

    pub fn checksums(&self) -> Vec<u128> {
        self.entries.iter().map(|e| e.result_checksum).collect()
    }
}

/// Tracks progress through a replay attempt: statements are re-issued one
/// at a time and each reply's checksum is compared against the one
/// recorded during the original execution.
pub struct ReplayCursor<'a> {
    log: &'a TransactionLog,
    next: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStep {
    /// The step's checksum matched; more statements remain to replay.
    Continue,
    /// The step's checksum matched and it was the last statement.
    Done,
    /// The step's checksum did not match the original execution's result.
    /// Replay is terminal at this point; the session must be closed.
    Diverged { index: usize },
}

impl<'a> ReplayCursor<'a> {
    pub fn new(log: &'a TransactionLog) -> Self {
        Self { log, next: 0 }
    }

    pub fn next_statement(&self) -> Option<&'a [u8]> {
        self.log.entries.get(self.next).map(|e| e.statement.as_slice())
    }

    /// Feed in the checksum of the reply the replay target produced for
    /// the statement just issued.
    pub fn observe(&mut self, result_checksum: u128) -> ReplayStep {
        let idx = self.next;
        let expected = self.log.entries[idx].result_checksum;
        self.next += 1;
        if expected != result_checksum {
            return ReplayStep::Diverged { index: idx };
        }
        if self.next >= self.log.entries.len() {
            ReplayStep::Done
        } else {
            ReplayStep::Continue
        }
    }
}

/// Re-executes every statement logged by a transaction over `reader`/
/// `writer` — a freshly acquired connection to a new master — comparing
/// each reply's live checksum against the one recorded during the original
/// execution. Called once the original backend is found to be lost while a
/// transaction was open; a mismatch means the new master's state diverged
/// from what the client already saw, so the session cannot be recovered.
pub async fn replay_transaction<R, W>(
    log: &TransactionLog,
    reader: &mut PacketReader<R>,
    writer: &mut PacketWriter<W>,
) -> Result<()>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    let mut cursor = ReplayCursor::new(log);
    writer.reset_seq();
    while let Some(statement) = cursor.next_statement() {
        writer.write_all(&[CommandCode::ComQuery as u8])?;
        writer.write_all(statement)?;
        writer.end_packet().await?;
        writer.flush_all().await?;

        let reply = read_logical_response(reader).await?;
        match cursor.observe(checksum(&reply)) {
            ReplayStep::Continue => continue,
            ReplayStep::Done => return Ok(()),
            ReplayStep::Diverged { index } => {
                return Err(Error::ReplayFailed(format!(
                    "replayed statement {index} diverged from its recorded result"
                )));
            }
        }
    }
    Ok(())
}

/// Reads one statement's worth of backend reply packets, relying on the
/// fact that every connection in this proxy negotiates
/// `CLIENT_DEPRECATE_EOF`: a response is either a single OK/ERR packet, or
/// a result set whose column and row packets all precede a final OK-with-
/// EOF-header packet, with no intermediate EOF packet to watch for.
pub(crate) async fn read_logical_response<R>(reader: &mut PacketReader<R>) -> Result<Vec<u8>>
where
    R: AsyncRead + Send + Unpin,
{
    let mut acc = Vec::new();
    loop {
        let (_, pkt) = reader.next_async().await?.ok_or_else(|| {
            Error::ReplayFailed("backend closed connection during replay".to_string())
        })?;
        let terminal = pkt.is_err_packet() || pkt.is_ok_packet() || pkt.is_result_set_eof_packet();
        acc.extend_from_slice(&pkt);
        if terminal {
            break;
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        assert_eq!(checksum(b"hello"), checksum(b"hello"));
        assert_ne!(checksum(b"hello"), checksum(b"world"));
    }

    #[test]
    fn log_caps_at_configured_size() {
        let mut log = TransactionLog::new(10);
        log.record(b"short", checksum(b"r1"));
        assert!(!log.is_capped());
        log.record(b"this one is far too long", checksum(b"r2"));
        assert!(log.is_capped());
        assert!(log.is_empty());
    }

    #[test]
    fn checksum_sequence_matches_recorded_order() {
        let mut log = TransactionLog::new(1024);
        log.record(b"INSERT INTO t VALUES (1)", checksum(b"ok1"));
        log.record(b"INSERT INTO t VALUES (2)", checksum(b"ok2"));
        assert_eq!(log.checksums(), vec![checksum(b"ok1"), checksum(b"ok2")]);
    }

    #[test]
    fn replay_succeeds_when_checksums_match() {
        let mut log = TransactionLog::new(1024);
        log.record(b"INSERT INTO t VALUES (1)", checksum(b"ok1"));
        log.record(b"INSERT INTO t VALUES (2)", checksum(b"ok2"));
        let mut cursor = ReplayCursor::new(&log);
        assert_eq!(cursor.next_statement(), Some(&b"INSERT INTO t VALUES (1)"[..]));
        assert_eq!(cursor.observe(checksum(b"ok1")), ReplayStep::Continue);
        assert_eq!(cursor.next_statement(), Some(&b"INSERT INTO t VALUES (2)"[..]));
        assert_eq!(cursor.observe(checksum(b"ok2")), ReplayStep::Done);
    }

    #[test]
    fn replay_detects_divergence() {
        let mut log = TransactionLog::new(1024);
        log.record(b"UPDATE t SET v = v + 1", checksum(b"ok1"));
        let mut cursor = ReplayCursor::new(&log);
        assert_eq!(
            cursor.observe(checksum(b"different")),
            ReplayStep::Diverged { index: 0 }
        );
    }
}
