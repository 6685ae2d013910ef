use crate::backend::backend_mgr::BackendMgr;
use crate::backend::pool::pooled_conn_mgr::PooledConnMgr;
use crate::backend::router::TargetRole;
use crate::backend::{DbConnPhase, DbUserConnLifeCycle};
use crate::protocol::mysql::basic::HandshakeResponse;
use crate::protocol::mysql::constants::CommandCode;
use crate::protocol::mysql::packet::packet_reader::PacketReader;
use crate::protocol::mysql::packet::packet_writer::PacketWriter;
use crate::protocol::mysql::packet::*;
use crate::replay;
use crate::router::{ResponseAction, RouteDecision};
use crate::server::auth::{gen_user_salt, Authenticator};
use crate::server::forwarder::query_forward::{forward_and_checksum, QueryForwarder};
use crate::server::forwarder::reset_conn_forward::ResetConnForwarder;
use crate::server::forwarder::stmt_prepare_forward::StmtPrepareForwarder;
use crate::server::forwarder::{change_user_forward, ComForwarder, GenericComForwarder};
use crate::server::{init_sql_com_labels, ProxyServer};
use crate::session::Session;

use async_trait::async_trait;
use common::metrics::common_labels;
use common::metrics::metric_def::{
    MXCORE_REPLAY_ATTEMPTS_TOTAL, MXCORE_WORKER_SESSIONS, PROXY_COM_LATENCY,
};
use deadpool::managed::Object;
use hashbrown::HashMap;
use num_traits::FromPrimitive;
use rustls::server::ServerConfig;
use std::io::Error;
use std::ops::DerefMut;
use std::sync::Arc;
use std::thread;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::rustls;
use tracing::{debug, warn};

/// Owns one accepted client connection end to end: the handshake, backend
/// acquisition, authentication replay, and the command forwarding loop.
/// A fresh `ProxySession` is created per accepted connection; its
/// lifetime is the connection's lifetime.
pub struct ProxySession<A> {
    sql_com_labels: HashMap<u8, Vec<(&'static str, String)>>,
    backend_mgr: Arc<BackendMgr>,
    authenticator: A,
    transaction_replay: bool,
    transaction_replay_attempts: u32,
    transaction_replay_max_size: usize,
}

impl<A: Authenticator> ProxySession<A> {
    pub fn new(
        backend_mgr: Arc<BackendMgr>,
        authenticator: A,
        transaction_replay: bool,
        transaction_replay_attempts: u32,
        transaction_replay_max_size: usize,
    ) -> Self {
        Self {
            sql_com_labels: init_sql_com_labels().clone(),
            backend_mgr,
            authenticator,
            transaction_replay,
            transaction_replay_attempts,
            transaction_replay_max_size,
        }
    }

    pub async fn connect<'a, R, W>(
        &'a self,
        reader: R,
        mut writer: W,
        #[cfg(feature = "tls")] tls_conf: &Option<Arc<ServerConfig>>,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Send + Unpin,
        W: AsyncWrite + Send + Unpin,
    {
        let salt = gen_user_salt();
        #[cfg(feature = "tls")]
        let (seq, handshake_response, handshake_pkt, mut reader) =
            self.on_conn(reader, &mut writer, salt, tls_conf).await?;
        #[cfg(not(feature = "tls"))]
        let (seq, handshake_response, handshake_pkt, mut reader) =
            self.on_conn(reader, &mut writer, salt, None).await?;

        let password = handshake_response.auth_response.clone();
        let default_db = handshake_response
            .database
            .as_ref()
            .map(|d| String::from_utf8_lossy(d).to_string());
        let db_user = handshake_response.db_user_string();

        // The session owns classification, routing and replay bookkeeping
        // for every statement the connection will ever send; authentication
        // itself always targets the master, acquired the same way every
        // later statement is.
        let mut session = Session::new(
            db_user.clone(),
            default_db,
            &password,
            &[],
            Arc::clone(&self.backend_mgr),
            self.transaction_replay_max_size,
        );
        common::metrics::gauge_inc(MXCORE_WORKER_SESSIONS, 1_f64, None);

        let connect_result = self.run_session(&mut reader, &mut writer, &mut session, seq, &handshake_pkt, &handshake_response, db_user).await;
        common::metrics::gauge_dec(MXCORE_WORKER_SESSIONS, 1_f64, None);
        connect_result
    }

    async fn run_session<R, W>(
        &self,
        reader: &mut PacketReader<R>,
        writer: &mut W,
        session: &mut Session,
        seq: u8,
        handshake_pkt: &Packet,
        handshake_response: &HandshakeResponse,
        db_user: String,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Send + Unpin,
        W: AsyncWrite + Send + Unpin,
    {
        let initial_decision = RouteDecision {
            role: TargetRole::Master,
            response: ResponseAction::ExpectClientBound,
            replicate_session_wide: false,
            opens_transaction: false,
            closes_transaction: false,
        };
        let pooled_conn = session
            .acquire_backend(&initial_decision)
            .await
            .map_err(|e| Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        let conn_uid = pooled_conn.id.clone();
        let mut backend_client_guard = pooled_conn.inner_conn.lock().await;

        let conn_life_cycle = { pooled_conn.get_conn_life_cycle().await };
        let (backend_reader, backend_writer) = backend_client_guard.deref_mut();
        backend_writer.reset_seq();

        let mut mut_writer = PacketWriter::new(writer);
        let auth_result = if let Some(conn_phase) = conn_life_cycle.conn_phase() {
            match conn_phase {
                DbConnPhase::Command => {
                    debug!("connection phase already Command, id={conn_uid:?}");
                    self.authenticator
                        .continue_auth::<R, W>(
                            backend_writer,
                            backend_reader,
                            &mut mut_writer,
                            reader,
                            seq,
                            handshake_response,
                        )
                        .await
                }
                _ => {
                    debug!("connection phase still Connection, id={conn_uid:?}");
                    self.authenticator
                        .reply_handshake_response::<R, W>(
                            backend_writer,
                            backend_reader,
                            &mut mut_writer,
                            reader,
                            seq,
                            (handshake_pkt, handshake_response),
                        )
                        .await
                }
            }
        } else {
            debug!("first authentication on this connection, id={conn_uid:?}");
            self.authenticator
                .reply_handshake_response::<R, W>(
                    backend_writer,
                    backend_reader,
                    &mut mut_writer,
                    reader,
                    seq,
                    (handshake_pkt, handshake_response),
                )
                .await
        };
        match auth_result {
            Ok(()) => {
                pooled_conn
                    .update_conn_life_cycle(DbUserConnLifeCycle::new_conn_life_cycle(
                        db_user,
                        DbConnPhase::Command,
                    ))
                    .await;
                debug!("authentication succeeded, connection phase set to Command");
            }
            Err(_e) => {
                pooled_conn
                    .update_conn_life_cycle(DbUserConnLifeCycle::new_conn_life_cycle(
                        db_user,
                        DbConnPhase::Connection,
                    ))
                    .await;
                debug!("authentication failed, command loop not entered");
                return Ok(());
            }
        }
        drop(backend_client_guard);

        self.on_com(reader, &mut mut_writer, session, pooled_conn, TargetRole::Master, handshake_response)
            .await
    }

    /// Drives the command loop for the lifetime of the connection: reads
    /// one client command at a time, classifies `COM_QUERY` statements
    /// through `session` and swaps to whichever backend the routing
    /// decision calls for, forwards the command, and retries once through
    /// transaction replay if the currently attached backend turns out to
    /// be lost mid-transaction.
    async fn on_com<R, W>(
        &self,
        client_reader: &mut PacketReader<R>,
        client_writer: &mut PacketWriter<W>,
        session: &mut Session,
        mut current_conn: Object<PooledConnMgr>,
        mut current_role: TargetRole,
        handshake_response: &HandshakeResponse,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Send + Unpin,
        W: AsyncWrite + Send + Unpin,
    {
        loop {
            let pkt_opt = client_reader.next_async().await?;
            if pkt_opt.is_none() {
                warn!("received empty packet, malformed packet error");
                return Err(Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Malform packet error".to_string(),
                ));
            }
            let (seq, client_packet) = pkt_opt.unwrap();
            let recv_com_code = client_packet[0];
            let com_code = CommandCode::from_u8(recv_com_code).unwrap();

            // Per-statement read/write routing only applies to `COM_QUERY`
            // text statements, which is all the classifier understands;
            // every other command code keeps using whichever backend is
            // already attached to the session.
            let route_decision = if com_code == CommandCode::ComQuery {
                Some(session.route_query(&client_packet[1..]))
            } else {
                None
            };

            if let Some(decision) = &route_decision {
                let must_switch = decision.opens_transaction
                    || (!session.in_transaction() && decision.role != current_role);
                if must_switch {
                    current_conn = session
                        .acquire_backend(decision)
                        .await
                        .map_err(|e| Error::new(std::io::ErrorKind::Other, e.to_string()))?;
                    current_role = decision.role;
                }
            }

            let com_forwarder: Box<dyn ComForwarder<R, W>> = match com_code {
                CommandCode::ComStmtPrepare | CommandCode::ComStmtClose => {
                    Box::new(StmtPrepareForwarder {
                        com_code,
                        request: client_packet.clone(),
                    })
                }
                CommandCode::ComQuery
                | CommandCode::ComStmtExecute
                | CommandCode::ComProcessInfo
                | CommandCode::ComFieldList
                | CommandCode::ComStmtFetch => Box::new(QueryForwarder { com_code }),
                CommandCode::ComQuit => Box::new(ResetConnForwarder),
                CommandCode::ComChangeUser => Box::new(change_user_forward::ChangeUserForwarder),
                _ => Box::new(GenericComForwarder),
            };

            let labels = self.sql_com_labels.get(&recv_com_code).unwrap();
            let _com_latency =
                common::metrics::MetricsTimer::new_with_labels(PROXY_COM_LATENCY, labels);

            let first_attempt = self
                .forward_one_statement(
                    seq,
                    com_code,
                    &client_packet,
                    handshake_response,
                    com_forwarder.as_ref(),
                    client_reader,
                    client_writer,
                    &mut current_conn,
                    session,
                    route_decision.is_some(),
                )
                .await;

            if let Err(e) = first_attempt {
                if !session.in_transaction() {
                    return Err(e);
                }
                warn!(error = %e, "backend lost mid-transaction, attempting replay recovery");
                self.try_recover_transaction(session, &mut current_conn, &mut current_role)
                    .await
                    .map_err(|_| e)?;
                self.forward_one_statement(
                    seq,
                    com_code,
                    &client_packet,
                    handshake_response,
                    com_forwarder.as_ref(),
                    client_reader,
                    client_writer,
                    &mut current_conn,
                    session,
                    route_decision.is_some(),
                )
                .await?;
            }

            if let Some(decision) = &route_decision {
                session.record_executed(&client_packet[1..], decision);
            }

            if com_code == CommandCode::ComQuit {
                common::metrics::gauge_dec(
                    common::metrics::metric_def::PROXY_CURR_CONN,
                    1_f64,
                    Some(common_labels()),
                );
                break;
            }
        }
        Ok(())
    }

    /// Writes `client_packet` to whichever backend `current_conn` holds and
    /// forwards the reply to the client. Statements that are part of an
    /// open transaction have their reply checksummed and folded into the
    /// transaction log instead of being forwarded through the ordinary
    /// `ComForwarder::forward` path, so a later replay attempt has
    /// something to compare against.
    #[allow(clippy::too_many_arguments)]
    async fn forward_one_statement<R, W>(
        &self,
        seq: u8,
        com_code: CommandCode,
        client_packet: &Packet,
        handshake_response: &HandshakeResponse,
        com_forwarder: &dyn ComForwarder<R, W>,
        client_reader: &mut PacketReader<R>,
        client_writer: &mut PacketWriter<W>,
        current_conn: &mut Object<PooledConnMgr>,
        session: &mut Session,
        is_routed_query: bool,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Send + Unpin,
        W: AsyncWrite + Send + Unpin,
    {
        let mut guard = current_conn.inner_conn.lock().await;
        let (backend_reader, backend_writer) = guard.deref_mut();

        com_forwarder
            .write_to_backend(
                seq,
                com_code,
                handshake_response,
                client_packet.clone(),
                backend_writer,
            )
            .await?;

        if is_routed_query && session.in_transaction() {
            let checksum = forward_and_checksum(backend_reader, client_writer).await?;
            session.log_transaction_statement(&client_packet[1..], checksum);
        } else {
            com_forwarder
                .forward(
                    client_reader,
                    client_writer,
                    backend_writer,
                    backend_reader,
                    handshake_response,
                )
                .await?;
        }
        Ok(())
    }

    /// Recovers from a backend lost while a transaction was open: drops the
    /// pin to the dead master, re-acquires a master connection (possibly a
    /// newly promoted one), and replays every statement logged for the
    /// transaction so far, comparing each reply's checksum against the one
    /// recorded live. Bounded by `transaction_replay_attempts`; a session
    /// whose log was already capped (too large to replay) or that opted out
    /// via `--transaction-replay=false` fails immediately.
    async fn try_recover_transaction(
        &self,
        session: &mut Session,
        current_conn: &mut Object<PooledConnMgr>,
        current_role: &mut TargetRole,
    ) -> Result<(), Error> {
        if !self.transaction_replay
            || session.transaction_log().is_empty()
            || session.transaction_log().is_capped()
        {
            return Err(Error::new(
                std::io::ErrorKind::Other,
                "transaction replay not available for this session",
            ));
        }

        let master_decision = RouteDecision {
            role: TargetRole::Master,
            response: ResponseAction::ExpectClientBound,
            replicate_session_wide: false,
            opens_transaction: false,
            closes_transaction: false,
        };

        for _ in 0..self.transaction_replay_attempts {
            common::metrics::counter_inc(MXCORE_REPLAY_ATTEMPTS_TOTAL, 1, None);
            session.clear_transaction_pin();
            let new_conn = match session.acquire_backend(&master_decision).await {
                Ok(c) => c,
                Err(_) => continue,
            };
            let replayed = {
                let mut guard = new_conn.inner_conn.lock().await;
                let (reader, writer) = guard.deref_mut();
                replay::replay_transaction(session.transaction_log(), reader, writer).await
            };
            if replayed.is_ok() {
                *current_conn = new_conn;
                *current_role = TargetRole::Master;
                return Ok(());
            }
        }
        Err(Error::new(
            std::io::ErrorKind::Other,
            "transaction replay exhausted all attempts",
        ))
    }

}

#[async_trait]
impl<A: Authenticator> ProxyServer for ProxySession<A> {
    async fn on_conn<R, W>(
        &self,
        r: R,
        w: &mut W,
        scramble: [u8; 20],
        #[cfg(feature = "tls")] tls_conf: &Option<Arc<ServerConfig>>,
    ) -> Result<(u8, HandshakeResponse, Packet, PacketReader<R>), Error>
    where
        R: AsyncRead + Send + Unpin,
        W: AsyncWrite + Send + Unpin,
    {
        let mut client_reader = PacketReader::new(r);
        let mut client_writer = PacketWriter::new(w);
        let conn_id = thread::current().id().as_u64().get();
        #[cfg(feature = "tls")]
        let (seq, handshake_response, pkt) = self
            .authenticator
            .initial_handshake(
                conn_id,
                scramble,
                &mut client_reader,
                &mut client_writer,
                tls_conf,
            )
            .await?;
        #[cfg(not(feature = "tls"))]
        let (seq, handshake_response, pkt) = self
            .authenticator
            .initial_handshake(
                conn_id,
                scramble,
                &mut client_reader,
                &mut client_writer,
                &None,
            )
            .await?;
        Ok((seq, handshake_response, pkt, client_reader))
    }

    async fn close(&self) {}
}
