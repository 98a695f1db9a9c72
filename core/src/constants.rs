//! Named constants shared by every module: port addresses, reset fill
//! patterns, and the XOR instruction mask.

/// Mask applied to a fetched instruction word before decode, and to a word
/// before it is stored as instruction memory. `0x134A9 xor 0x15555 == call 0x0AA`.
pub const INSTRUCTION_MASK: u32 = 0x1_5555;

/// RAM reset fill. Decodes (after XOR) to `call 0x0AA`, the warm entry vector.
pub const RAM_RESET_FILL: u32 = 0x1_34A9;

/// Stack reset fill (data stack, return stack): the encoded all-NOP word.
pub const STACK_RESET_FILL: u32 = 0x1_5555;

/// Default B register value: the IO port address.
pub const PORT_IO: u32 = 0x15D;
pub const PORT_RIGHT: u32 = 0x1D5;
pub const PORT_LEFT: u32 = 0x175;
pub const PORT_UP: u32 = 0x145;
pub const PORT_DOWN: u32 = 0x115;
/// Multiport bundling right, down, left, up.
pub const PORT_RDLU: u32 = 0x1A5;

/// Warm-start entry point (word address 0x0AA, after the reset's implicit
/// `call`).
pub const WARM_ENTRY: u32 = 0x0AA;

/// Masked P value boot nodes start execution from.
pub const BOOT_START_P: u32 = 0xAA;
/// Masked P value non-boot nodes start execution from.
pub const COLD_START_P: u32 = 0xA9;

/// RAM/ROM address space split.
pub const RAM_BASE: u32 = 0x00;
pub const RAM_SIZE: u32 = 0x40;
pub const ROM_BASE: u32 = 0x80;
pub const ROM_SIZE: u32 = 0x40;

/// Bit 8 set marks an IO-space address.
pub const IO_ADDR_BIT: u32 = 0x100;
/// Bit 9 is the "extended arithmetic" flag carried through P increments.
pub const EXTENDED_ARITH_BIT: u32 = 0x200;

/// Depth of the circular data and return stacks.
pub const STACK_DEPTH: usize = 8;

/// Default baud period in emulator step units (§6.3).
pub const BOOT_BAUD_PERIOD: u32 = 723;

/// Magic byte marking the start of an async-boot frame 1.
pub const BOOT_MAGIC: u8 = 0xAE;

/// The standard reset vector boot-node set (§4.4).
pub const DEFAULT_BOOT_NODES: &[u16] = &[708, 8, 100, 17, 300, 200];
