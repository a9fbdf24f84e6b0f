//! A single bidirectional map between disassembly addresses and function
//! base names.
//!
//! AVR disassembly can encode a call target as either a byte address or a
//! word address depending on the instruction form. Rather than juggling
//! several textual address formats, every address is compared as a byte
//! address, and the only ambiguity that matters structurally is "was this
//! encoded as a byte address or a word address", which
//! [`AddressResolver::resolve_any`] tries both ways for.

use std::collections::HashMap;

use crate::model::Function;

#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    by_byte_address: HashMap<u32, String>,
}

impl AddressResolver {
    /// Builds the map from a function partition. Runtime symbols are
    /// included so that calls into startup/runtime code still resolve.
    pub fn build(functions: &[Function]) -> Self {
        let mut by_byte_address = HashMap::new();
        for f in functions {
            by_byte_address.insert(f.byte_address, f.base_name.clone());
        }
        AddressResolver { by_byte_address }
    }

    pub fn resolve_byte_address(&self, addr: u32) -> Option<&str> {
        self.by_byte_address.get(&addr).map(String::as_str)
    }

    pub fn resolve_word_address(&self, addr: u32) -> Option<&str> {
        self.by_byte_address.get(&(addr * 2)).map(String::as_str)
    }

    /// Tries `addr` as a byte address first, then as a word address
    /// (`addr * 2`): call instructions encode absolute targets as byte
    /// addresses, while jump instructions may encode word addresses.
    pub fn resolve_any(&self, addr: u32) -> Option<&str> {
        self.resolve_byte_address(addr)
            .or_else(|| self.resolve_word_address(addr))
    }
}
