use chunk_perf::{ClientConfig, Connector, Error, Responder, Role, ServerConfig};
use clap::Parser;
use std::{net::Ipv4Addr, process::ExitCode, time::Duration};
use tracing_subscriber::filter::EnvFilter;

fn run_client_mode(config: ClientConfig) -> chunk_perf::Result<()> {
    let report = Connector::new(config).run()?;
    println!("{report}");
    Ok(())
}

fn run_server_mode(config: ServerConfig) -> chunk_perf::Result<()> {
    let responder = Responder::bind(config)?;
    responder.serve()
}

fn init_env_filter(env_filter: EnvFilter) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_level(true)
        .with_target(true);

    let subscriber = subscriber.finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> ExitCode {
    // Initialize log bridge to capture log crate messages - MUST be first!
    tracing_log::LogTracer::init().expect("Failed to set logger");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    init_env_filter(env_filter);

    let args = Args::parse();
    let result = args.role().and_then(|role| match role {
        Role::Client(config) => run_client_mode(config),
        Role::Server(config) => run_server_mode(config),
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("chunkperf: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Measures TCP throughput by requesting fixed-size chunks of zeros.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Run as server, listening on the given address
    #[arg(short, long, value_name = "LISTEN_IP", num_args = 0..=1,
          default_missing_value = "0.0.0.0", conflicts_with = "client")]
    server: Option<Ipv4Addr>,
    /// Run as client, connecting to the given address
    #[arg(short, long, value_name = "CONNECT_IP", num_args = 0..=1,
          default_missing_value = "127.0.0.1")]
    client: Option<Ipv4Addr>,
    /// The port to listen on or connect to
    #[arg(short, long, default_value_t = chunk_perf::config::DEFAULT_PORT)]
    port: u16,
    /// Local port the client binds before connecting, 0 lets the OS pick
    #[arg(short, long, default_value_t = 0)]
    bind_port: u16,
    /// The number of chunks to request
    #[arg(short, long, default_value_t = chunk_perf::config::DEFAULT_NUM_CHUNKS)]
    num_chunks: u64,
    /// The chunk length in bytes
    #[arg(short = 'l', long, default_value_t = chunk_perf::config::DEFAULT_CHUNK_LENGTH)]
    chunk_length: u64,
    /// Pause between chunks in milliseconds
    #[arg(short = 'd', long, default_value_t = 0)]
    chunk_delay_ms: u64,
    /// Socket read/write timeout in milliseconds, 0 waits forever
    #[arg(long, default_value_t = 0)]
    io_timeout_ms: u64,
    /// Serve each connection on its own thread (server only)
    #[arg(long)]
    concurrent: bool,
}

impl Args {
    fn role(&self) -> chunk_perf::Result<Role> {
        let io_timeout = Some(Duration::from_millis(self.io_timeout_ms));
        match (self.server, self.client) {
            (Some(listen_addr), None) => Ok(Role::Server(
                ServerConfig::new(listen_addr, self.port)
                    .with_concurrent(self.concurrent)
                    .with_io_timeout(io_timeout),
            )),
            (None, Some(connect_addr)) => Ok(Role::Client(
                ClientConfig::new(connect_addr, self.port)
                    .with_bind_port(self.bind_port)
                    .with_num_chunks(self.num_chunks)
                    .with_chunk_length(self.chunk_length)
                    .with_chunk_delay(Duration::from_millis(self.chunk_delay_ms))
                    .with_io_timeout(io_timeout),
            )),
            (None, None) => Err(Error::Config("must specify either -c or -s".to_string())),
            (Some(_), Some(_)) => Err(Error::Config("-c and -s are mutually exclusive".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_role_is_a_configuration_error() {
        let args = Args::try_parse_from(["chunkperf", "-n", "3"]).unwrap();
        assert!(matches!(args.role(), Err(Error::Config(_))));
    }

    #[test]
    fn bare_client_flag_uses_loopback() {
        let args = Args::try_parse_from(["chunkperf", "-c", "-n", "3", "-l", "10", "-d", "5"]).unwrap();
        match args.role().unwrap() {
            Role::Client(config) => {
                assert_eq!(config.server_addr(), "127.0.0.1:1234".parse().unwrap());
                assert_eq!(config.num_chunks, 3);
                assert_eq!(config.chunk_length, 10);
                assert_eq!(config.chunk_delay, Duration::from_millis(5));
                assert_eq!(config.io_timeout, None);
            }
            other => panic!("expected client role, got {other:?}"),
        }
    }

    #[test]
    fn server_flag_takes_listen_address() {
        let args = Args::try_parse_from(["chunkperf", "-s", "10.0.0.1", "-p", "4000", "--concurrent"]).unwrap();
        match args.role().unwrap() {
            Role::Server(config) => {
                assert_eq!(config.listen_socket_addr(), "10.0.0.1:4000".parse().unwrap());
                assert!(config.concurrent);
            }
            other => panic!("expected server role, got {other:?}"),
        }
    }

    #[test]
    fn client_and_server_conflict() {
        assert!(Args::try_parse_from(["chunkperf", "-s", "-c"]).is_err());
    }
}
