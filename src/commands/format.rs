//! Format-cmd command implementation

use qspiram_core::spi::{format_command, opcodes};
use qspiram_core::LaneCount;

/// Print the command word the bridge shifts out for `opcode`
pub fn run_format(opcode: u8, lanes: LaneCount) {
    let word = format_command(opcode, lanes);
    let digits = (word.bits() / 4) as usize;
    println!("0x{:0digits$X}", word.value(), digits = digits);

    log::info!(
        "Opcode 0x{:02X} over {}: {} bits, {} cycles",
        opcode,
        lanes,
        word.bits(),
        lanes.command_cycles()
    );
    if !opcodes::is_read(opcode) && !opcodes::is_write(opcode) {
        log::warn!("0x{:02X} is not a read or write opcode the RAMs understand", opcode);
    } else if opcode != lanes.read_opcode() && opcode != lanes.write_opcode() {
        log::info!(
            "The bridge itself sends 0x{:02X} / 0x{:02X} in this mode",
            lanes.read_opcode(),
            lanes.write_opcode()
        );
    }
}
