//! File-system image builder
//!
//! Packs files into the on-disk layout read by `FileSystem`. Shared by the
//! build script, which produces the boot image, and the unit tests. Only
//! depends on `std`.

const BLOCK_SIZE: usize = 4096;
const NAME_LEN: usize = 32;
const MAX_ENTRIES: usize = 63;
const MAX_FILE_BLOCKS: usize = BLOCK_SIZE / 4 - 1;

const TYPE_RTC: u32 = 0;
const TYPE_DIRECTORY: u32 = 1;
const TYPE_REGULAR: u32 = 2;

struct Entry {
    name: Vec<u8>,
    file_type: u32,
    data: Vec<u8>,
}

pub struct ImageBuilder {
    entries: Vec<Entry>,
}

impl ImageBuilder {
    /// Starts with the `.` directory entry.
    pub fn new() -> Self {
        let mut builder = Self { entries: Vec::new() };
        builder.push(".", TYPE_DIRECTORY, &[]);
        builder
    }

    /// Names longer than 32 bytes are cut to 32.
    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.push(name, TYPE_REGULAR, data);
        self
    }

    pub fn rtc(mut self, name: &str) -> Self {
        self.push(name, TYPE_RTC, &[]);
        self
    }

    fn push(&mut self, name: &str, file_type: u32, data: &[u8]) {
        assert!(self.entries.len() < MAX_ENTRIES, "too many directory entries");
        assert!(data.len() <= MAX_FILE_BLOCKS * BLOCK_SIZE, "{} is too large", name);
        let mut name = name.as_bytes().to_vec();
        name.truncate(NAME_LEN);
        self.entries.push(Entry { name, file_type, data: data.to_vec() });
    }

    /// Lay out the boot block, one inode per regular file (after the empty
    /// inode 0) and the data blocks.
    pub fn build(&self) -> Vec<u8> {
        let files: Vec<&Entry> = self.entries.iter().filter(|e| e.file_type == TYPE_REGULAR).collect();
        let inode_count = files.len() + 1;
        let block_count: usize = files.iter().map(|f| f.data.len().div_ceil(BLOCK_SIZE)).sum();

        let mut image = vec![0u8; (1 + inode_count + block_count) * BLOCK_SIZE];
        put_u32(&mut image, 0, self.entries.len() as u32);
        put_u32(&mut image, 4, inode_count as u32);
        put_u32(&mut image, 8, block_count as u32);

        let mut next_inode = 1;
        for (slot, entry) in self.entries.iter().enumerate() {
            let base = 64 + slot * 64;
            image[base..base + entry.name.len()].copy_from_slice(&entry.name);
            put_u32(&mut image, base + NAME_LEN, entry.file_type);
            if entry.file_type == TYPE_REGULAR {
                put_u32(&mut image, base + NAME_LEN + 4, next_inode);
                next_inode += 1;
            }
        }

        let data_base = (1 + inode_count) * BLOCK_SIZE;
        let mut next_block = 0;
        for (index, file) in files.iter().enumerate() {
            let inode = (2 + index) * BLOCK_SIZE;
            put_u32(&mut image, inode, file.data.len() as u32);
            for (n, chunk) in file.data.chunks(BLOCK_SIZE).enumerate() {
                put_u32(&mut image, inode + 4 + n * 4, next_block as u32);
                let start = data_base + next_block * BLOCK_SIZE;
                image[start..start + chunk.len()].copy_from_slice(chunk);
                next_block += 1;
            }
        }
        image
    }
}

fn put_u32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
