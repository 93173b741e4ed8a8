//! Pipeline stages for documentation-to-GFM conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. an in-process engine in tests) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ engine.parse ──▶ filter ──▶ engine.render ──▶ postprocess
//! (path)   (pdf/docx)   (html → tree)   (rules)    (tree → gfm)     (tables, code, chars)
//! ```
//!
//! 1. [`input`]   — classify the source path and decode it as UTF-8
//! 2. [`extract`] — PDF and DOCX only: shell out to produce HTML
//! 3. [`engine`]  — parse HTML into a pandoc document tree; later render it
//! 4. [`filter`]  — the rule set over the tree ([`ast`] holds the node model)
//! 5. [`postprocess`] — deterministic text cleanup, sequencing [`tables`]
//!    and [`codeblocks`]

pub mod ast;
pub mod codeblocks;
pub mod engine;
pub mod extract;
pub mod filter;
pub mod input;
pub mod postprocess;
pub mod tables;
