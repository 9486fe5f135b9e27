use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use ackflow::config::AckConfig;
use ackflow::endpoint::EndpointId;
use ackflow::fragment::FragmentOptions;
use ackflow::module::Module;
use ackflow::segment::Channel;
use ackflow::send_poster::{SendPoster, SendToken};
use ackflow::seq::Seq;
use bytes::Bytes;
use clap::Parser;
use clap_derive::Parser;
use tracing::{info, warn, Level};

/// Sends fragments between two modules over an in-memory link that drops packets at random
#[derive(Parser)]
struct Args {
    /// share of packets dropped in each direction, between 0.0 and 1.0
    #[clap(long, default_value_t = 0.05)]
    loss: f64,

    #[clap(long, default_value_t = 100)]
    fragments: usize,

    #[clap(long, default_value_t = 10_000)]
    fragment_len: usize,

    #[clap(long, default_value_t = 256)]
    window: usize,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,
}

type Link = Rc<RefCell<Vec<(SendToken, Vec<u8>)>>>;

struct LinkPoster {
    link: Link,
}

impl SendPoster for LinkPoster {
    fn post(&mut self, _endpoint: EndpointId, token: SendToken, _channel: Channel, packet: &[u8]) {
        self.link.borrow_mut().push((token, packet.to_vec()));
    }
}

/// Hands everything posted by `from` to `to`, dropping packets at random. Every post is
///  completed, delivered or not.
fn transfer(link: &Link, from: &mut Module, to: &mut Module, to_endpoint: EndpointId, loss: f64) -> anyhow::Result<usize> {
    let mut num_received = 0;

    let packets = std::mem::take(&mut *link.borrow_mut());
    for (token, packet) in packets {
        if rand::random::<f64>() >= loss {
            if to.on_packet_received(to_endpoint, &packet)?.is_some() {
                num_received += 1;
            }
        }
        from.send_complete(token);
    }
    Ok(num_received)
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .try_init()
        .ok();

    if !(0.0..1.0).contains(&args.loss) {
        anyhow::bail!("loss must be at least 0.0 and less than 1.0");
    }

    let config = Arc::new(AckConfig {
        window_size: args.window,
        ..AckConfig::default_config()
    });

    let a_to_b = Link::default();
    let b_to_a = Link::default();
    let mut a = Module::new(config.clone(), Box::new(LinkPoster { link: a_to_b.clone() }))?;
    let mut b = Module::new(config.clone(), Box::new(LinkPoster { link: b_to_a.clone() }))?;

    let a_start = Seq::random();
    let b_start = Seq::random();
    let ep_a = a.add_endpoint(a_start, b_start);
    let ep_b = b.add_endpoint(b_start, a_start);

    let completed = Rc::new(RefCell::new(0usize));
    let mut num_submitted = 0;
    let mut num_received = 0;

    let mut ticks = tokio::time::interval(Duration::from_millis(1));
    let started = tokio::time::Instant::now();

    while *completed.borrow() < args.fragments {
        let now = ticks.tick().await.into_std();

        while num_submitted < args.fragments {
            let completed = completed.clone();
            let payload = Bytes::from(vec![(num_submitted % 256) as u8; args.fragment_len]);
            let options = FragmentOptions {
                dst: None,
                always_callback: true,
                on_complete: Some(Box::new(move |_, _| *completed.borrow_mut() += 1)),
            };
            match a.send_fragment(ep_a, payload, options) {
                Ok(_) => num_submitted += 1,
                Err(e) => {
                    warn!("fragment {} not submitted yet: {}", num_submitted, e);
                    break;
                }
            }
        }

        a.progress(now);
        b.progress(now);

        num_received += transfer(&a_to_b, &mut a, &mut b, ep_b, args.loss)?;
        transfer(&b_to_a, &mut b, &mut a, ep_a, args.loss)?;
    }

    info!("transferred {} fragments of {} bytes ({} segments) in {:?}",
        args.fragments, args.fragment_len, num_received, started.elapsed());
    a.log_stats();
    b.log_stats();
    Ok(())
}
