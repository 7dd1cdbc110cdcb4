use crate::error::Result;
use crossbeam::channel::{Receiver, Sender};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// Token that terminates the input stream.
pub const EXIT_TOKEN: &str = "exit";

/// Read whitespace-delimited tokens from `reader`, parse them as integers,
/// and send them to the pipeline in order.
///
/// Reading stops at the literal [`EXIT_TOKEN`] or end of input. A token
/// that fails to parse produces a notice on `feedback` and is skipped. If
/// the pipeline has hung up, the source stops quietly; whichever stage
/// failed reports its error from [`crate::RunningPipeline::wait`].
pub fn read_integers<R, W>(reader: R, mut feedback: W, output: Sender<i64>) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in reader.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            if token == EXIT_TOKEN {
                debug!("exit token received, ending input");
                return Ok(());
            }
            match token.parse::<i64>() {
                Ok(value) => {
                    debug!(value, "value read from input");
                    if output.send(value).is_err() {
                        return Ok(());
                    }
                }
                Err(_) => {
                    warn!(token, "input token is not an integer");
                    writeln!(feedback, "Invalid value, try again.")?;
                }
            }
        }
    }
    Ok(())
}

/// Receive the final stream and render each value as one line on `writer`.
pub fn write_received<W: Write>(input: &Receiver<i64>, mut writer: W) -> Result<()> {
    for value in input.iter() {
        debug!(value, "sink received value");
        writeln!(writer, "Received data: {value}")?;
    }
    Ok(())
}
