use std::collections::HashMap;

use guestwalk_core::Va;

use crate::LinuxSymbolSource;

/// A parsed `System.map` listing.
///
/// Each line is `<hex address> <type letter> <name>`; the type letter is
/// kept out of the lookup, so `T do_fork` and `t do_fork` are the same
/// symbol. Later lines win on duplicate names.
#[derive(Debug, Default, Clone)]
pub struct SystemMap {
    symbols: HashMap<String, Va>,
}

impl SystemMap {
    /// Parses a `System.map` listing.
    ///
    /// Malformed lines are skipped with a `debug!` event rather than
    /// failing the whole map; real-world maps occasionally carry junk.
    pub fn parse(text: &str) -> Self {
        let mut symbols = HashMap::new();

        for line in text.lines() {
            let mut fields = line.split_whitespace();

            let (address, _type, name) = match (fields.next(), fields.next(), fields.next()) {
                (Some(address), Some(t), Some(name)) => (address, t, name),
                _ => {
                    if !line.trim().is_empty() {
                        tracing::debug!(line, "skipping malformed System.map line");
                    }
                    continue;
                }
            };

            match u64::from_str_radix(address, 16) {
                Ok(address) => {
                    symbols.insert(name.to_string(), Va(address));
                }
                Err(_) => {
                    tracing::debug!(line, "skipping malformed System.map line");
                }
            }
        }

        Self { symbols }
    }

    /// Returns the number of symbols in the map.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Checks whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl LinuxSymbolSource for SystemMap {
    fn symbol_address(&self, name: &str) -> Option<Va> {
        self.symbols.get(name).copied()
    }
}
