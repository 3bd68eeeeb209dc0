//! Whole programs, assembled from source and run on a standard machine.

use micro0::{assemble, disassemble, System};

/// Prints a zero-terminated string by patching the low address byte of its
/// own `load` instruction on every pass.
const HELLO_WORLD: &str = r#"
            .org 0x0
            load [zero]
            store [offset]
    repeat: load [offset]
            store [0x000D]      ; low byte of the next instruction's address
            load [0x1000]
            brz [finished]
            store [0xf000]
            load [offset]
            add [one]
            store [offset]
            load [zero]
            brz [repeat]
  finished: brz [finished]

            .org 0x1000
    string: db 0x48 db 0x65 db 0x6c db 0x6c db 0x6f db 0x20
            db 0x57 db 0x6f db 0x72 db 0x6c db 0x64 db 0x21
            db 0x00
      zero: db 0x00
       one: db 0x01
    offset: db 0x00
"#;

fn run_source(source: &str, cycles: u64) -> System {
    let image = assemble(source).unwrap();
    let mut system = System::new().unwrap();
    system.load(image);
    system.run(cycles).unwrap();
    system
}

#[test]
fn test_hello_world() {
    let system = run_source(HELLO_WORLD, 1000);

    assert_eq!(system.output_text(), "Hello World!");
    assert_eq!(system.cpu().cycles, 1000);
    // Parked on the final self-branch.
    assert_eq!(system.cpu().regs.acc, 0);
}

#[test]
fn test_hello_world_layout() {
    let image = assemble(HELLO_WORLD).unwrap();

    assert_eq!(image.len(), 0x1010);
    assert_eq!(&image[0x1000..0x100c], b"Hello World!");
    // `load [0x1000]` sits at 0x000C, so its low address byte is 0x000D.
    assert_eq!(&image[0x0c..0x0f], &[0x01, 0x00, 0x10]);

    let listing = disassemble(&image[..0x27], 0);
    assert!(listing.contains("load [0x1000]"));
    assert!(listing.contains("store [0xf000]"));
}

#[test]
fn test_output_grows_one_character_per_pass() {
    let mut system = System::new().unwrap();
    system.load(assemble(HELLO_WORLD).unwrap());

    let mut previous = 0;
    for _ in 0..40 {
        system.step().unwrap();
        let len = system.output().len();
        assert!(len == previous || len == previous + 1);
        previous = len;
    }
    assert!(previous > 0);
}

#[test]
fn test_counter_loop() {
    // Count down from 3 by adding 0xFF until zero, then park.
    let source = r#"
            .org 0x0
      loop: load [count]
            add [minus_one]
            store [count]
            brz [done]
            load [zero]
            brz [loop]
      done: brz [done]

            .org 0x0020
     count: db 3
 minus_one: db 0xff
      zero: db 0
    "#;

    let system = run_source(source, 500);
    assert_eq!(system.ram()[0x20], 0);
    assert_eq!(system.cpu().regs.acc, 0);
}
