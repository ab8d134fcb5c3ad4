//! Counts down 10 seconds of wall time, driving every time-based tool from
//! one `poll()` loop. Run with `RUST_LOG=debug` for the registry's trace.

use statekit_core::CancelToken;
use statekit_tools::dates::{DateLike, DatesComparator, DatesComparatorConfig};
use statekit_tools::ticker::{Ticker, TickerConfig};
use web_time::{Duration, SystemTime};

fn main() {
    env_logger::init();

    let session = CancelToken::new();

    let deadline = SystemTime::now() + Duration::from_secs(10);
    let countdown = DatesComparator::new(DatesComparatorConfig {
        dates: Some((DateLike::Now, deadline.into())),
        cancel: Some(session.clone()),
        clock: None,
    });

    let ticker = Ticker::new(TickerConfig {
        ticks_per: Duration::from_secs(1),
        cancel: Some(session.clone()),
        clock: None,
    });
    ticker.start();

    {
        let diff = countdown.signal().clone();
        ticker.ticks_signal().subscribe(move |tick| {
            let d = diff.get();
            println!(
                "tick {tick}: {:02}:{:02}:{:02} remaining",
                d.hours, d.minutes, d.seconds
            );
        });
    }

    while !countdown.is_empty() {
        countdown.poll();
        ticker.poll();
        std::thread::sleep(Duration::from_millis(50));
    }

    println!("done after {} tick(s)", ticker.ticks());
    session.cancel();
    log::info!("session torn down");
}
