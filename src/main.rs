use log::{error, info, Level, Metadata, Record};
use srcon::client::{Client, Config};
use srcon::event::Event;
use std::env;
use std::error::Error;
use tokio::signal;

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = log::set_logger(&SimpleLogger).map(|()| log::set_max_level(log::LevelFilter::Info));

    let mut args = env::args().skip(1);
    let (host, port, password, command) = match (args.next(), args.next(), args.next(), args.next())
    {
        (Some(host), Some(port), Some(password), Some(command)) => {
            (host, port.parse::<u16>()?, password, command)
        }
        _ => {
            eprintln!("usage: srcon <host> <port> <password> <command> [--udp [--no-challenge]]");
            std::process::exit(2);
        }
    };

    let mut config = Config::new(host, port, password);
    let rest: Vec<String> = args.collect();
    if rest.iter().any(|a| a == "--udp") {
        config = config.udp(!rest.iter().any(|a| a == "--no-challenge"));
    }

    let (client, mut events) = Client::connect(config).await?;

    loop {
        tokio::select!(
            event = events.recv() => match event {
                Some(Event::Authenticated) => {
                    info!("authenticated");
                    client.send(&command).await?;
                }
                Some(Event::Response(body)) => {
                    println!("{body}");
                    break;
                }
                Some(Event::Server(body)) => info!("server: {}", body),
                Some(Event::Debug(diagnostic)) => info!("debug: {}", diagnostic),
                Some(Event::Error(err)) => {
                    error!("{err}");
                    break;
                }
                Some(Event::End) | None => break,
            },
            _ = signal::ctrl_c() => break,
        );
    }

    client.disconnect();
    info!("bye");
    Ok(())
}
