//! Declarative schema and name resolution
//!
//! A schema is built once by the application, usually on the stack next to
//! the host state it maps, and is only read afterwards.
//!
//! ```
//! # use core::cell::Cell;
//! # use ucini_core::schema::{FieldDescriptor, Schema, Section};
//! # use ucini_core::field::Field;
//! let port = Cell::new(80u16);
//! let flags = Cell::new(0u8);
//! let net = [
//!     FieldDescriptor::new("port", Field::u16(&port)),
//!     FieldDescriptor::new("dhcp", Field::flag(&flags, 0)),
//! ];
//! let sections = [Section::new("net", &net)];
//! let schema = Schema::new(&sections);
//! # assert_eq!(schema.entry_count(), 2);
//! ```

use crate::field::Field;
use crate::tag::TypeTag;

/// One mapped value: `name=...` inside a section
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor<'a> {
    /// Key as it appears left of `=`
    pub name: &'a str,
    /// Host value the key maps to
    pub field: Field<'a>,
}

impl<'a> FieldDescriptor<'a> {
    /// Map `name` to `field`
    pub const fn new(name: &'a str, field: Field<'a>) -> Self {
        Self { name, field }
    }

    /// Packed type descriptor of the field
    pub fn type_tag(&self) -> TypeTag {
        self.field.type_tag()
    }
}

/// A `[name]` section and its entries
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    /// Name between the brackets
    pub name: &'a str,
    /// Entries in dump order
    pub entries: &'a [FieldDescriptor<'a>],
}

impl<'a> Section<'a> {
    /// Section `name` holding `entries`
    pub const fn new(name: &'a str, entries: &'a [FieldDescriptor<'a>]) -> Self {
        Self { name, entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the section has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by exact name, starting the scan at `hint`
    pub fn find_entry(&self, name: &str, hint: &mut Hint) -> Option<usize> {
        hint.scan(self.entries, name)
    }
}

/// The full mapping from file to host state
#[derive(Debug, Clone, Copy)]
pub struct Schema<'a> {
    /// Sections in dump order
    pub sections: &'a [Section<'a>],
}

impl<'a> Schema<'a> {
    /// Schema over `sections`
    pub const fn new(sections: &'a [Section<'a>]) -> Self {
        Self { sections }
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the schema has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of entries across all sections
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    /// Find a section by exact name, starting the scan at `hint`
    pub fn find_section(&self, name: &str, hint: &mut Hint) -> Option<usize> {
        hint.scan(self.sections, name)
    }
}

/// Round-robin lookup hint
///
/// Remembers the index of the last match. Files are usually written in
/// schema order, so starting the next scan there finds the following name
/// on the first or second comparison. A stale hint only costs time: the scan
/// still covers every element exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hint(usize);

impl Hint {
    /// Index the next scan starts from
    pub fn index(self) -> usize {
        self.0
    }

    /// Circular scan for `name`; moves the hint to the match, if any
    fn scan<T: Named>(&mut self, items: &[T], name: &str) -> Option<usize> {
        let len = items.len();
        if len == 0 {
            return None;
        }

        let start = self.0 % len;
        let found = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&index| items[index].name() == name)?;
        self.0 = found;
        Some(found)
    }
}

/// Anything the resolver can look up by name
trait Named {
    fn name(&self) -> &str;
}

impl Named for FieldDescriptor<'_> {
    fn name(&self) -> &str {
        self.name
    }
}

impl Named for Section<'_> {
    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
impl Named for &str {
    fn name(&self) -> &str {
        self
    }
}
