//! Timing command implementation

use qspiram_core::BridgeConfig;

/// Print the cycle cost of each kind of transaction
pub fn run_timing(config: &BridgeConfig) {
    let bits = config.data_width.bits();

    println!("Bridge Timing");
    println!("=============");
    println!();
    println!("Lanes:           {}", config.lanes);
    println!("Word width:      {} bits", bits);
    println!("Dummy cycles:    {}", config.dummy_cycles);
    println!("Byte order:      {} endian", config.endianness);
    println!(
        "Burst dummy:     {}",
        if config.burst_read_dummy { "yes" } else { "no" }
    );
    match config.max_burst {
        Some(max) => println!("Max burst:       {} transactions", max),
        None => println!("Max burst:       unbounded"),
    }
    match config.idle_release {
        Some(ticks) => println!("Idle release:    after {} ticks", ticks),
        None => println!("Idle release:    never"),
    }
    println!();

    let rows = [
        ("Cold read", config.cold_read_cycles()),
        ("Burst read", config.burst_read_cycles()),
        ("Cold write", config.cold_write_cycles()),
        ("Burst write", config.burst_write_cycles()),
    ];
    println!("{:<14} {:>7} {:>11}", "Transaction", "Cycles", "Bits/cycle");
    for (name, cycles) in rows {
        println!(
            "{:<14} {:>7} {:>11.2}",
            name,
            cycles,
            bits as f32 / cycles as f32
        );
    }
}
