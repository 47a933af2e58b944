
//! The bus level: line vocabulary, the bit-frame state machines and the
//! byte queue between interrupt and foreground context.

pub mod frame;
pub mod io;
pub mod queue;
pub mod status;
