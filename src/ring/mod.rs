//! Consistent Hash Ring
//!
//! Places the fixed peer set on a hash ring with virtual nodes and maps each
//! key to an ordered preference list of distinct peers. The ring is built
//! once at startup and never changes, so every node derives bit-identical
//! placement independently.

pub mod ring;

#[cfg(test)]
mod tests;
