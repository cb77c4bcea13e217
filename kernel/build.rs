//! Builds the user programs and packs them into the boot file system.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use xmas_elf::program::Type;
use xmas_elf::ElfFile;

#[path = "src/fs/image.rs"]
#[allow(dead_code)]
mod image;

/// Virtual address of byte 0 of a loaded image
const IMAGE_BASE: u64 = 0x0804_8000;
/// Bytes of ELF header kept at the front of the image
const HEADER_LEN: usize = 52;

const PROGRAMS: [&str; 8] = ["shell", "ls", "cat", "hello", "counter", "grep", "sigtest", "fault"];

fn main() {
    println!("cargo:rerun-if-changed=../user/src");
    println!("cargo:rerun-if-changed=../user/files");
    println!("cargo:rerun-if-changed=../user/linker.ld");
    println!("cargo:rerun-if-changed=src/fs/image.rs");
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds only run unit tests; they never embed the image.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    let status = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".into()))
        .args([
            "build",
            "--release",
            "--target",
            "i686-triterm.json",
            "-Zbuild-std=core,compiler_builtins",
            "-Zbuild-std-features=compiler-builtins-mem",
        ])
        .current_dir("../user")
        .env_remove("RUSTFLAGS")
        .env_remove("CARGO_ENCODED_RUSTFLAGS")
        .status()
        .expect("failed to run cargo for the user programs");
    if !status.success() {
        panic!("building the user programs failed");
    }

    let target_dir = Path::new("../user/target/i686-triterm/release");
    let mut builder = image::ImageBuilder::new();
    for program in PROGRAMS {
        let elf_path = target_dir.join(program);
        let elf = fs::read(&elf_path).unwrap_or_else(|e| panic!("{}: {}", elf_path.display(), e));
        builder = builder.file(program, &flatten(program, &elf));
    }

    let mut texts: Vec<PathBuf> = fs::read_dir("../user/files")
        .expect("missing user/files")
        .map(|entry| entry.expect("unreadable user/files entry").path())
        .collect();
    texts.sort();
    for path in texts {
        let name = path.file_name().and_then(|n| n.to_str()).expect("non UTF-8 file name");
        builder = builder.file(name, &fs::read(&path).expect("unreadable text file"));
    }
    builder = builder.rtc("rtc");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR not set"));
    fs::write(out_dir.join("fs.img"), builder.build()).expect("cannot write fs.img");
}

/// Lay the loadable segments out as they sit in memory, starting at
/// `IMAGE_BASE`, with the ELF header (magic and entry point) at offset 0.
fn flatten(name: &str, elf_data: &[u8]) -> Vec<u8> {
    let elf = ElfFile::new(elf_data).unwrap_or_else(|e| panic!("{}: {}", name, e));
    let segments: Vec<_> = elf
        .program_iter()
        .filter(|ph| ph.get_type() == Ok(Type::Load))
        .collect();

    let end = segments
        .iter()
        .map(|ph| ph.virtual_addr() + ph.mem_size())
        .max()
        .unwrap_or(IMAGE_BASE);
    let mut image = vec![0u8; (end - IMAGE_BASE) as usize];
    image[..HEADER_LEN].copy_from_slice(&elf_data[..HEADER_LEN]);

    for ph in segments {
        assert!(ph.virtual_addr() >= IMAGE_BASE, "{}: segment below the image base", name);
        let start = (ph.virtual_addr() - IMAGE_BASE) as usize;
        let offset = ph.offset() as usize;
        let size = ph.file_size() as usize;
        image[start..start + size].copy_from_slice(&elf_data[offset..offset + size]);
    }
    image
}
