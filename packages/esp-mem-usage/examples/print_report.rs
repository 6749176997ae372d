use std::path::Path;

use esp_mem_usage::memory_map_for_flash_size;
use esp_mem_usage::report::{render_summary, MemoryReport};
use esp_mem_usage::NmParser;

fn main() {
    let mut map = memory_map_for_flash_size(1024 * 1024).unwrap();
    let listing = "\
3ffe8000 00000004 D myVar
3ffe8010 00000100 B rx_buffer
40100000 0000002c T call_user_start
40201010 00000080 T app_main
         U ets_printf
";
    let parsed = NmParser::new().parse(Path::new("firmware.elf"), listing, &mut map);

    eprint!("{}", render_summary(&map));
    let report = MemoryReport::new("firmware.elf", &map, &parsed);
    eprintln!("{}", report.to_json().unwrap());
}
