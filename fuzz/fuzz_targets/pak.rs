#![no_main]

use libfuzzer_sys::fuzz_target;
use packvfs::{Archive as _, ArchiveFormat, Claim, MemoryIo, PakFormat};

fuzz_target!(|data: &[u8]| {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(async {
        let io = Box::new(MemoryIo::new(data.to_vec()));
        // Arbitrary bytes must never panic the parser: they are either not
        // a PAK, a corrupt one, or a well-formed archive we can list.
        match PakFormat.try_open(io, "fuzz.pak", false).await {
            Ok(Claim::Mine(archive)) => {
                let _ = archive.read_dir("").await;
            }
            Ok(Claim::NotMine(_)) | Err(_) => {}
        }
    });
});
