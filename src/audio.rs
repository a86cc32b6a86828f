/// Fire-and-forget sound triggers. The core never waits on playback.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Explosion,
    EngineStart,
    EngineStop,
    EngineCabin,
}

pub trait AudioSink {
    fn play_cue(&mut self, cue: Cue);
}

/// Drops every cue.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl AudioSink for Silent {
    fn play_cue(&mut self, _cue: Cue) {}
}

/// Records cues in order; handy for headless runs and tests.
impl AudioSink for Vec<Cue> {
    fn play_cue(&mut self, cue: Cue) {
        self.push(cue);
    }
}
