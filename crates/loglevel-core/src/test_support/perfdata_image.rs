//! Builder for synthetic perf-data files.

use crate::perfdata::{ByteOrder, ENTRY_HEADER_LEN, MAGIC, PROLOGUE_LEN, SUPPORTED_MAJOR_VERSION};

const ALIGNMENT: usize = 8;

enum Counter {
    Long(i64),
    Text { value: String, capacity: usize },
}

/// Assembles a perf-data image with the given counters.
///
/// ```ignore
/// let image = PerfDataImage::new(ByteOrder::Little)
///     .text("sun.rt.javaCommand", "com.app.Main")
///     .build();
/// ```
pub struct PerfDataImage {
    order: ByteOrder,
    counters: Vec<(String, Counter)>,
}

impl PerfDataImage {
    /// Starts an empty image in `order`.
    #[must_use]
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            counters: Vec::new(),
        }
    }

    /// Adds a 64-bit counter.
    #[must_use]
    pub fn long(mut self, name: &str, value: i64) -> Self {
        self.counters.push((name.to_owned(), Counter::Long(value)));
        self
    }

    /// Adds a text counter sized to fit `value` and its terminator.
    #[must_use]
    pub fn text(self, name: &str, value: &str) -> Self {
        let capacity = value.len() + 1;
        self.text_with_capacity(name, value, capacity)
    }

    /// Adds a text counter padded with NULs to `capacity` bytes.
    #[must_use]
    pub fn text_with_capacity(mut self, name: &str, value: &str, capacity: usize) -> Self {
        self.counters.push((
            name.to_owned(),
            Counter::Text {
                value: value.to_owned(),
                capacity: capacity.max(value.len() + 1),
            },
        ));
        self
    }

    /// Serialises the image.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let order = self.order;
        let mut image = Vec::with_capacity(PROLOGUE_LEN);
        image.extend_from_slice(&MAGIC.to_be_bytes());
        image.extend_from_slice(&[order.flag(), SUPPORTED_MAJOR_VERSION, 0, 1]);
        image.resize(24, 0);
        image.extend_from_slice(&order.encode_i32(to_i32(PROLOGUE_LEN)));
        image.extend_from_slice(&order.encode_i32(to_i32(self.counters.len())));

        for (name, counter) in &self.counters {
            image.extend_from_slice(&encode_entry(order, name, counter));
        }
        image
    }
}

fn encode_entry(order: ByteOrder, name: &str, counter: &Counter) -> Vec<u8> {
    let name_offset = ENTRY_HEADER_LEN;
    let data_offset = align(name_offset + name.len() + 1);
    let (data_type, vector_length, data) = match counter {
        Counter::Long(value) => (b'J', 0, order.encode_i64(*value).to_vec()),
        Counter::Text { value, capacity } => {
            let mut bytes = value.as_bytes().to_vec();
            bytes.resize(*capacity, 0);
            (b'B', *capacity, bytes)
        }
    };
    let entry_length = align(data_offset + data.len());

    let mut entry = Vec::with_capacity(entry_length);
    entry.extend_from_slice(&order.encode_i32(to_i32(entry_length)));
    entry.extend_from_slice(&order.encode_i32(to_i32(name_offset)));
    entry.extend_from_slice(&order.encode_i32(to_i32(vector_length)));
    // type, flags, units, variability
    entry.extend_from_slice(&[data_type, 0, 1, 1]);
    entry.extend_from_slice(&order.encode_i32(to_i32(data_offset)));
    entry.extend_from_slice(name.as_bytes());
    entry.push(0);
    entry.resize(data_offset, 0);
    entry.extend_from_slice(&data);
    entry.resize(entry_length, 0);
    entry
}

const fn align(length: usize) -> usize {
    length.div_ceil(ALIGNMENT) * ALIGNMENT
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
