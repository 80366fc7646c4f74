use ferrous_rproxy_domain::config::ServerConfig;
use ferrous_rproxy_infrastructure::dns::DnsServerHandler;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const UDP_RECV_BUFFER: usize = 65535;

/// Serves UDP and TCP on the configured address until SIGINT or SIGTERM.
pub async fn start_dns_server(server: &ServerConfig, handler: DnsServerHandler) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = server.listen_address().parse()?;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let num_workers = server.udp_workers.max(1);

    info!(bind_address = %socket_addr, num_workers, "Starting DNS proxy with SO_REUSEPORT");

    let handler = Arc::new(handler);
    let shutdown = CancellationToken::new();
    let mut join_set: JoinSet<()> = JoinSet::new();

    for i in 0..num_workers {
        let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
        let handler_udp = Arc::clone(&handler);
        let token = shutdown.clone();
        join_set.spawn(async move {
            run_udp_worker(udp_socket, handler_udp, i, token).await;
        });
    }

    let tcp_listener = create_tcp_listener(domain, socket_addr)?;
    let handler_tcp = Arc::clone(&handler);
    let token = shutdown.clone();
    join_set.spawn(async move {
        run_tcp_acceptor(tcp_listener, handler_tcp, token).await;
    });

    info!("DNS proxy ready: {} UDP workers and TCP on {}", num_workers, socket_addr);

    wait_for_signal().await;
    info!("Shutdown signal received");
    shutdown.cancel();

    while join_set.join_next().await.is_some() {}
    Ok(())
}

async fn run_udp_worker(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    worker_id: usize,
    shutdown: CancellationToken,
) {
    let mut recv_buf = vec![0u8; UDP_RECV_BUFFER];

    loop {
        let (n, from) = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = socket.recv_from(&mut recv_buf) => match result {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // ICMP errors from earlier replies surface here on some
                    // platforms; the socket stays usable.
                    debug!(worker = worker_id, error = %e, "UDP recv error");
                    continue;
                }
            },
        };

        let query: Arc<[u8]> = Arc::from(&recv_buf[..n]);
        let handler = Arc::clone(&handler);
        let socket = Arc::clone(&socket);
        tokio::spawn(async move {
            if let Some(response) = handler.handle_udp(&query, from).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    debug!(client = %from, error = %e, "UDP send failed");
                }
            }
        });
    }
}

async fn run_tcp_acceptor(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "TCP accept error");
                    continue;
                }
            },
        };

        let handler = Arc::clone(&handler);
        let token = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = handler.handle_tcp_connection(stream, peer) => {}
            }
        });
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "Cannot install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
