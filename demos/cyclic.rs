//! Hand out a batch of identifiers with the cyclic policy and print them
//!
//! Run with `RUST_LOG=trace` to see the allocator's own log output.

use idr::Idr;

const NUM_IDS: usize = 20;

fn main() {
    env_logger::init();

    let mut idr = Idr::new();
    for count in 0..NUM_IDS {
        match idr.alloc_cyclic(count) {
            Ok(id) => println!("test{:02} id: {:02}", count, id),
            Err(error) => {
                eprintln!("test{:02} failed: {}", count, error);
                break;
            }
        }
    }
}
