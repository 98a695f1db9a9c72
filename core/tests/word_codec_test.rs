//! Cross-cutting codec properties: every opcode round-trips through
//! mnemonic lookup and through assemble/disassemble/XOR, independent of
//! which module produces the word.

use ga144_core::word::{self, ALL_OPCODES, SlotInput};

#[test]
fn every_opcode_round_trips_through_its_mnemonic() {
    for op in ALL_OPCODES {
        let mnemonic = op.mnemonic();
        assert_eq!(word::Opcode::from_mnemonic(mnemonic), Some(op), "mnemonic {mnemonic} did not resolve back to {op:?}");
    }
}

#[test]
fn xor_encoding_is_self_inverse_for_every_opcode_word() {
    for op in ALL_OPCODES {
        let slots = [SlotInput::Op(op), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty];
        let Ok(assembled) = word::assemble(slots) else { continue };
        let encoded = word::xor_encode(assembled);
        assert_eq!(word::xor_decode(encoded), assembled);
        assert_eq!(word::xor_encode(word::xor_encode(assembled)), assembled);
    }
}

#[test]
fn a_bare_opcode_alone_in_slot_zero_disassembles_back_to_itself() {
    for op in ALL_OPCODES {
        let slots = [SlotInput::Op(op), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty];
        let Ok(assembled) = word::assemble(slots) else { continue };
        let decoded = word::disassemble(assembled);
        assert_eq!(decoded[0], word::DecodedSlot::Op(op));
    }
}

#[test]
fn an_address_class_opcode_preserves_its_operand() {
    for op in ALL_OPCODES.iter().copied().filter(|op| op.requires_address()) {
        let addr = 0x3AAu32 & ((1u32 << 10) - 1);
        let slots = [SlotInput::Addressed(op, addr), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty];
        let assembled = word::assemble(slots).expect("a lone address-class opcode always assembles");
        let decoded = word::disassemble(assembled);
        let word::DecodedSlot::Addressed(decoded_op, decoded_addr) = decoded[0] else {
            panic!("expected an addressed slot for {op:?}");
        };
        assert_eq!(decoded_op, op);
        assert_eq!(decoded_addr, addr & 0x3FF);
    }
}
