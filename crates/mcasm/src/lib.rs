//! # mcasm — machine-code emitter with label fixups and an object pool
//!
//! `mcasm` is a pure Rust, `no_std + alloc` machine-code assembler meant to
//! sit at the bottom of a compiler pipeline. Code is emitted through one
//! method per instruction; label-relative instructions may reference labels
//! that are bound later, and binding patches every pending site in place.
//!
//! ## Quick Start
//!
//! ```rust
//! use mcasm::riscv::{Assembler, Register::*, Xlen};
//!
//! let mut asm = Assembler::new(Xlen::Rv64);
//! asm.li(A0, 7)?;
//! asm.ret()?;
//! let code = asm.finalize()?;
//! assert_eq!(code.size(), 4); // c.li + c.ret
//! # Ok::<(), mcasm::AsmError>(())
//! ```
//!
//! ## Features
//!
//! - **RV32 / RV64** — base integer ISA plus `M A F D C Zicsr Zba Zbb Zbs`.
//! - **Labels** — forward and backward references, caller-chosen branch width.
//! - **Object pool** — constants and object references addressed through `PP`.
//! - **Pseudo-ops** — `li`, frame setup, push/pop lists, compare-and-branch.
//! - **Disassembler** — decode and print finalized code for golden tests.
//! - **`no_std` + `alloc`** — embeddable in JITs and firmware.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// An assembler narrows and reinterprets integers everywhere and packs dense
// hex literals; the lints below are expected in this context.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::bool_to_int_with_if,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::too_many_arguments,
    clippy::missing_errors_doc,
    clippy::many_single_char_names
)]

extern crate alloc;

/// Append-only code buffer with a region map and comments.
pub mod buffer;
/// The per-architecture encoder interface.
pub mod encoder;
/// Error types.
pub mod error;
/// Label arena and pending reference sites.
pub mod label;
/// Architecture-independent operand scaffolding.
pub mod operand;
/// Object pool.
pub mod pool;
/// RISC-V assembler, decoder and disassembler.
pub mod riscv;

pub use buffer::{CodeBuffer, Comment, EmitValue, Region, RegionKind};
pub use encoder::InstructionEncoder;
pub use error::{ArchName, AsmError};
pub use label::{Label, LabelUse, Labels};
pub use operand::{fits_signed, fits_unsigned, AddressMode};
pub use pool::{ObjectPool, ObjectRef, PoolEntry};
