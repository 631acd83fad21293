// src/arena.rs

//! Per-package string arena
//!
//! Every piece of text a decoder pulls out of a metadata document is copied
//! into the arena of the package it belongs to. Fields hold small `Copy`
//! handles instead of owned strings, so a package with thousands of files
//! still frees all of its text in a single deallocation.

/// Handle to a string stored in a [`StringArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStr {
    offset: usize,
    len: usize,
}

impl ArenaStr {
    /// Length of the referenced string in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bump allocator for the strings of a single package
#[derive(Debug, Default)]
pub struct StringArena {
    buf: String,
}

impl StringArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with room for `capacity` bytes of text
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Copy `s` into the arena and return a handle to it
    pub fn alloc(&mut self, s: &str) -> ArenaStr {
        let offset = self.buf.len();
        self.buf.push_str(s);

        ArenaStr { offset, len: s.len() }
    }

    /// Resolve a handle issued by this arena
    pub fn get(&self, s: ArenaStr) -> &str {
        self.buf.get(s.offset..s.offset + s.len).unwrap_or_default()
    }

    /// Total bytes of text held by the arena
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
