#![no_main]
use libfuzzer_sys::fuzz_target;
use mcasm::riscv::{compress, decode, decode_word, expand, Disassembler, Xlen};

fuzz_target!(|data: &[u8]| {
    for xlen in [Xlen::Rv32, Xlen::Rv64] {
        // Decoding and listing arbitrary bytes must never panic.
        let _ = Disassembler::new(xlen).disassemble_bytes(data);

        let mut offset = 0;
        while let Some(d) = decode(&data[offset..], xlen) {
            assert!(d.len == 2 || d.len == 4);
            if let Some(half) = compress(d.word, xlen) {
                let word = expand(half, xlen).expect("compressed form expands");
                assert!(decode_word(word, xlen).is_some());
            }
            offset += d.len;
        }
    }
});
