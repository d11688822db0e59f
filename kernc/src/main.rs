use std::io::Write;

use clap::Parser;
use kernc::{run, Args, Config, Error};

fn main() -> Result<(), Error> {
    env_logger::builder()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{}: {:?}: {style}{}{style:#}: {}",
                ts,
                std::thread::current().id(),
                record.level(),
                record.args()
            )
        })
        .init();

    let config = Config::new(Args::parse())?;
    let results = run(&config);
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(Error::SourcesFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}
