// src/parser/other.rs

//! other.xml decoder
//!
//! Same identity scheme as filelists.xml, with `<changelog>` entries as the
//! package body.

use super::{read_identity, read_version, Attributes, DecodeSummary, Emitter, HandlerResult, SaxHandler};
use crate::arena::ArenaStr;
use crate::package::{ChangelogEntry, Package};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Toplevel,
    Package,
}

/// Attributes of the `<changelog>` being read
#[derive(Debug, Clone, Copy)]
struct PendingEntry {
    author: Option<ArenaStr>,
    date: Option<ArenaStr>,
}

pub(crate) struct OtherDecoder<F> {
    state: State,
    out: Emitter<F>,
    entry: Option<PendingEntry>,
}

impl<F: FnMut(&Package)> OtherDecoder<F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            state: State::Toplevel,
            out: Emitter::new(callback),
            entry: None,
        }
    }
}

impl<F: FnMut(&Package)> SaxHandler for OtherDecoder<F> {
    fn start_element(&mut self, name: &str, attrs: &Attributes) -> HandlerResult {
        if name == "package" {
            let pkg = self.out.open()?;
            read_identity(pkg, attrs);
            self.state = State::Package;
            return Ok(());
        }

        if self.state != State::Package {
            return Ok(());
        }
        let Some(pkg) = self.out.current_mut() else {
            return Ok(());
        };

        match name {
            "version" => read_version(pkg, attrs),
            "changelog" => {
                self.entry = Some(PendingEntry {
                    author: attrs.get("author").map(|a| pkg.intern(a)),
                    date: attrs.get("date").map(|d| pkg.intern(d)),
                });
            }
            _ => {}
        }

        Ok(())
    }

    fn end_element(&mut self, name: &str, text: &str) -> HandlerResult {
        if self.state != State::Package {
            return Ok(());
        }

        match name {
            "package" => {
                self.out.emit();
                self.entry = None;
                self.state = State::Toplevel;
            }
            "changelog" => {
                if let Some(pkg) = self.out.current_mut() {
                    let pending = self.entry.take();
                    let entry = ChangelogEntry {
                        author: pending.and_then(|e| e.author),
                        date: pending.and_then(|e| e.date),
                        changelog: pkg.intern(text),
                    };
                    pkg.push_changelog(entry);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn finish(&mut self) -> DecodeSummary {
        self.entry = None;
        self.state = State::Toplevel;
        self.out.finish()
    }
}
