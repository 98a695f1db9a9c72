//! The CLI's `--config chip.toml` description of boot nodes, ROM tables,
//! and baud rate: what a running chip needs before it can boot a program
//! over the mesh or accept a pre-assembled image directly.

use std::collections::HashMap;
use std::path::Path;

use ga144_core::constants::{DEFAULT_BOOT_NODES, STACK_RESET_FILL};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChipConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_boot_nodes")]
    pub boot_nodes: Vec<u16>,
    /// Node -> sparse ROM image; missing cells fill with the stack reset
    /// pattern, the same value a freshly constructed core starts with.
    #[serde(default)]
    pub rom: HashMap<u16, Vec<u32>>,
    /// Bits per second for a bit-accurate boot over `step_with_serial_bits`;
    /// `run --via-boot-stream` installs the boot frame directly and does not
    /// consult this, the same way `load_via_boot_stream` bypasses pin timing.
    #[serde(default = "default_baud")]
    pub baud: u32,
}

fn default_name() -> String {
    "ga144".to_string()
}

fn default_boot_nodes() -> Vec<u16> {
    DEFAULT_BOOT_NODES.to_vec()
}

fn default_baud() -> u32 {
    921_600
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self { name: default_name(), boot_nodes: default_boot_nodes(), rom: HashMap::new(), baud: default_baud() }
    }
}

impl ChipConfig {
    /// Loads `path` if given, else the default search path
    /// (`dirs::config_dir()/ga144/chip.toml`), else falls back to defaults
    /// with nothing configured.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => dirs::config_dir().map(|d| d.join("ga144").join("chip.toml")),
        };

        match resolved {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(&p)?;
                Ok(toml::from_str(&text)?)
            }
            _ => Ok(ChipConfig::default()),
        }
    }

    pub fn rom_table(&self) -> HashMap<u16, [u32; 64]> {
        self.rom
            .iter()
            .map(|(&coord, sparse)| {
                let mut image = [STACK_RESET_FILL; 64];
                for (i, &value) in sparse.iter().take(64).enumerate() {
                    image[i] = value;
                }
                (coord, image)
            })
            .collect()
    }
}
