use crate::player::CadenzaBackend;
use anyhow::{Result, anyhow};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::{fs::File, io::BufReader, path::Path, time::Duration};

/// Default backend: one rodio sink on the default output device.
///
/// Owns its output stream, so it must live on the thread that created it.
pub struct RodioBackend {
    sink: Sink,
    _stream: OutputStream,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());

        Ok(RodioBackend {
            sink,
            _stream: stream,
        })
    }
}

impl CadenzaBackend for RodioBackend {
    fn play(&mut self, path: &Path) -> Result<Option<Duration>> {
        let source = decode(path)?;
        let duration = source.total_duration();

        self.sink.clear();
        self.sink.append(source);
        self.sink.play();

        Ok(duration)
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn seek_to(&mut self, pos: Duration) -> Result<()> {
        self.sink.try_seek(pos).map_err(|e| anyhow!("seek failed: {e}"))
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn track_ended(&self) -> bool {
        self.sink.empty()
    }
}

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}
