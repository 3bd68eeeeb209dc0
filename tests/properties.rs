//! Property tests for the instruction set and the bus.

use micro0::{Bus, CharOut, Cpu, Instruction, Ram, System};
use proptest::prelude::*;

fn bus_with(image: Vec<u8>) -> Bus {
    let mut bus = Bus::new();
    bus.attach(Box::new(Ram::with_contents(0, image))).unwrap();
    bus.attach(Box::new(CharOut::new(0xF000))).unwrap();
    bus
}

fn system_with(image: Vec<u8>, acc: u8) -> System {
    let mut system = System::new().unwrap();
    system.load(image);
    system.cpu_mut().regs.acc = acc;
    system
}

proptest! {
    #[test]
    fn prop_operand_is_little_endian(lo: u8, hi: u8) {
        let mut bus = bus_with(vec![0x01, lo, hi]);
        let mut cpu = Cpu::new();

        // settle, fetch, low byte, high byte
        cpu.tick_n(&mut bus, 4).unwrap();

        prop_assert_eq!(cpu.regs.index, u16::from(lo) | (u16::from(hi) << 8));
    }

    #[test]
    fn prop_load_reads_addressed_byte(lo: u8, hi in 0u8..0xF0, value: u8) {
        let address = u16::from(lo) | (u16::from(hi) << 8);
        let mut image = vec![0u8; 0xF000];
        image[address as usize] = value;
        image[0] = 0x01;
        image[1] = lo;
        image[2] = hi;
        let expected = image[address as usize];

        let mut system = system_with(image, 0);
        system.run(5).unwrap();

        prop_assert_eq!(system.cpu().regs.index, address);
        prop_assert_eq!(system.cpu().regs.acc, expected);
        prop_assert_eq!(system.cpu().regs.pc, 3);
    }

    #[test]
    fn prop_add_wraps(acc: u8, value: u8) {
        let mut system = system_with(vec![0x03, 0x03, 0x00, value], acc);
        system.run(6).unwrap();

        prop_assert_eq!(system.cpu().regs.acc, acc.wrapping_add(value));
        prop_assert_eq!(system.cpu().regs.buffer, value);
    }

    #[test]
    fn prop_branch_iff_zero(acc: u8, lo: u8, hi: u8) {
        let target = u16::from(lo) | (u16::from(hi) << 8);
        let mut system = system_with(vec![0x04, lo, hi], acc);
        system.run(5).unwrap();

        let expected = if acc == 0 { target } else { 3 };
        prop_assert_eq!(system.cpu().regs.pc, expected);
    }

    #[test]
    fn prop_tick_counts(index in 0usize..4, acc: u8) {
        let instr = Instruction::ALL[index];
        let mut system = system_with(vec![instr.opcode(), 0x03, 0x00, 0x00], acc);

        prop_assert_eq!(system.step().unwrap(), instr.total_ticks());
        prop_assert!(system.cpu().at_instruction_boundary());
    }

    #[test]
    fn prop_bus_routes_by_base(address: u16) {
        let bus = bus_with(vec![0; 4]);
        let name = bus.route(address).map(|d| d.name());

        let expected = if address >= 0xF000 { "char-out" } else { "ram" };
        prop_assert_eq!(name, Some(expected));
    }
}
