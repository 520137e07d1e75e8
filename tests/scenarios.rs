use mosaic::{
    codec, cover_resize, BlockAverager, BlockSpec, GridOverlay, Pixelizer, RasterBuffer,
    TileSetGenerator, DEFAULT_TILE_SIZES,
};

fn checker(w: u32, h: u32, cell: u32) -> RasterBuffer {
    let pixels: Vec<[u8; 4]> = (0..h)
        .flat_map(|y| {
            (0..w).map(move |x| {
                if ((x / cell) + (y / cell)) % 2 == 0 {
                    [32, 64, 96, 255]
                } else {
                    [220, 180, 140, 200]
                }
            })
        })
        .collect();
    RasterBuffer::from_pixels(w, h, &pixels).unwrap()
}

#[test]
fn four_colors_average_to_grey() {
    let mut img = RasterBuffer::from_pixels(
        2,
        2,
        &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 255, 255]],
    )
    .unwrap();
    BlockAverager::new(BlockSpec::square(2).unwrap()).pixelize(&mut img).unwrap();
    assert!(img.pixels().all(|p| p == [128, 128, 128, 255]));
}

#[test]
fn cover_crops_the_middle_square() {
    let src = checker(100, 50, 7);
    let out = cover_resize(&src, 50, 50).unwrap();
    assert_eq!(out.dimensions(), (50, 50));
    assert_eq!(out.pixel(0, 0), src.pixel(25, 0));
    assert_eq!(out.pixel(49, 49), src.pixel(74, 49));
}

#[test]
fn default_tile_family() {
    let src = checker(128, 128, 3);
    let specs = TileSetGenerator::square_specs(&DEFAULT_TILE_SIZES).unwrap();
    let set = TileSetGenerator::new().generate(&src, &specs).unwrap();
    assert_eq!(set.len(), 5);
    let whole = set.get("128").unwrap();
    let first = whole.pixel(0, 0);
    assert!(whole.pixels().all(|p| p[..3] == first[..3]));
}

#[test]
fn grid_after_averaging_is_stable() {
    let block = BlockSpec::new(6, 4).unwrap();
    let mut img = checker(31, 17, 5);
    BlockAverager::new(block).pixelize(&mut img).unwrap();
    let overlay = GridOverlay::new(block);
    overlay.pixelize(&mut img).unwrap();
    let once = img.clone();
    overlay.pixelize(&mut img).unwrap();
    assert_eq!(img, once);
}

#[test]
fn tiles_survive_png_round_trip() {
    let src = checker(64, 48, 4);
    let specs = TileSetGenerator::square_specs(&[16, 8]).unwrap();
    let set = TileSetGenerator::new()
        .with_grid(mosaic::GRID_BLACK)
        .generate(&src, &specs)
        .unwrap();
    for tile in &set {
        let bytes = codec::encode_png(&tile.buffer).unwrap();
        assert_eq!(codec::decode(&bytes).unwrap(), tile.buffer);
    }
}
