/// Number of 16-bit samples per DMA block.
pub const BLOCK_SAMPLES: usize = 1024;

/// Size of one block of 16-bit samples in bytes.
pub const BLOCK_BYTES: usize = BLOCK_SAMPLES * 2;

/// Length of the canonical PCM WAV header reserved at the front of a recording.
pub const WAV_HEADER_LEN: usize = 44;

/// Reverb delay line length in samples.
pub const REVERB_SAMPLES: usize = 1600;

/// Sample rate used until the configuration says otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Highest cascade order covered by the Butterworth Q table.
pub const MAX_CASCADE_ORDER: usize = 8;

/// Number of entries in the Q table: 1 + 2 + ... + MAX_CASCADE_ORDER.
pub const Q_TABLE_LEN: usize = MAX_CASCADE_ORDER * (MAX_CASCADE_ORDER + 1) / 2;

/// Maximum length of the ring modulator sine table.
pub const MAX_TONE_TABLE: usize = 2048;

/// Oversampling factor handed to the phase vocoder.
pub const PITCH_OVERSAMPLE: u32 = 4;

/// Largest chunk the streaming transport accepts in one send.
pub const STREAM_CHUNK_BYTES: usize = 1024;
