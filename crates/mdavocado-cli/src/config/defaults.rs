pub struct DefaultsConfig {
    pub chains: usize,
    pub splits: usize,
    pub cumulative: bool,
    pub threshold: f64,
    pub block_rows: usize,
    pub stride: usize,
    pub window_width: usize,
    pub penalty: f64,
    pub unwrap: bool,
    pub rewrap: bool,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub compose: bool,
    pub animate: bool,
    pub montage_program: &'static str,
    pub convert_program: &'static str,
    pub frame_delay: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            chains: 1,
            splits: 10,
            cumulative: false,
            threshold: 0.5,
            block_rows: 4096,
            stride: 100,
            window_width: 100,
            penalty: 1e4,
            unwrap: true,
            rewrap: true,
            canvas_width: 500,
            canvas_height: 500,
            compose: false,
            animate: true,
            montage_program: "montage",
            convert_program: "convert",
            frame_delay: 50,
        }
    }
}
