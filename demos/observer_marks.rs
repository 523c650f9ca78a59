use blank_solar_map::{
    ephemeris::AU,
    plot::{Color, Marker},
    BlankMapConfig, BlankMapScene, HeliographicStonyhurst, Observer,
};

fn main() {
    // An observer 60 degrees west of Earth, slightly inside 1 AU.
    let config = BlankMapConfig {
        observer: Observer::Coordinate(HeliographicStonyhurst::new(60.0, 0.0, 0.9 * AU)),
        marks: vec![(-600.0, 200.0), (0.0, -500.0), (750.0, 750.0), (1200.0, 0.0)],
        marker: Marker::Cross,
        marker_color: Color::rgb(200, 30, 30),
        grid_spacing_deg: 10.0,
        title: "Marks seen from a western observer".to_string(),
        ..BlankMapConfig::default()
    };

    let scene = BlankMapScene::build(&config).unwrap();

    for (mark, pixel) in scene.marks().iter().zip(scene.marked_pixels()) {
        println!("({}, {}) -> {:?}", mark.tx(), mark.ty(), pixel);
    }

    std::fs::create_dir_all("data/output").unwrap();
    scene.save_png("data/output/observer-marks.png").unwrap();
}
