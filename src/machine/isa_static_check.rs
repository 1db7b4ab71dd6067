//! Static checks for ISA stability.
//!
//! These tests ensure that instruction definitions (opcodes, mnemonics,
//! encoded lengths) remain unchanged across updates: the generated
//! machine and externally assembled programs must agree on the wire
//! format. Any modification to the ISA will cause these tests to fail.
