/// Data layer: traces, loading, and signal processing.
///
/// Architecture:
/// ```text
///  .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → WaveformCollection
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────┐
///   │ WaveformCollection │  Vec<Trace>, grouped by station
///   └────────────────────┘
///        │
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  signal   │ ◄── │  filter   │  bandpass presets → filtered copies
///   └──────────┘     └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod signal;
