use rideclass::config::{AnalysisConfig, HillFinderConfig, IntervalFinderConfig, ReferencePower};
use rideclass::hills::{HillFinder, HillFragment};
use rideclass::{read_rides, write_rides, Ride, RideAnalyzer, RideStreams, WorkoutType};
use std::fs;
use tempfile::TempDir;

/// Build a 1 Hz ride from a power profile on flat ground at 8 m/s
fn flat_ride(name: &str, power: Vec<f64>) -> Ride {
    let len = power.len();
    let streams = RideStreams::new(
        power,
        vec![120.0; len],
        (0..len).map(|i| i as f64 * 8.0).collect(),
        (0..len).map(|i| i as f64).collect(),
    );
    Ride::new(name, streams)
}

/// Steady base power with efforts of `effort_len` seconds every `period` seconds
fn efforts(len: usize, base: f64, effort: f64, period: usize, offset: usize, effort_len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            if i >= offset && (i - offset) % period < effort_len {
                effort
            } else {
                base
            }
        })
        .collect()
}

#[test]
fn test_steady_ride_is_endurance() {
    let analyzer = RideAnalyzer::new(&AnalysisConfig::default());
    let ride = analyzer
        .analyze(flat_ride("Zone 2", vec![100.0; 3600]), Some(250.0))
        .unwrap();

    assert!(ride.intervals.is_empty());
    assert!(ride.hills.is_empty());
    assert_eq!(ride.workout_type, WorkoutType::Endurance);

    let terrain = ride.terrain.unwrap();
    assert_eq!(terrain.percent_up, Some(0.0));
    assert_eq!(terrain.percent_flat, Some(1.0));
    assert_eq!(terrain.average_watts_uphill, None);
    assert_eq!(terrain.average_watts_flat, Some(100.0));
}

#[test]
fn test_hard_ride_with_short_efforts_is_race() {
    // 100 W base with 2-minute efforts at 300 W every 4 minutes
    let power = efforts(3600, 100.0, 300.0, 240, 60, 120);
    let analyzer = RideAnalyzer::new(&AnalysisConfig::default());
    let ride = analyzer.analyze(flat_ride("Crit", power), Some(250.0)).unwrap();

    assert!(ride.intervals.len() >= 10);
    for interval in &ride.intervals {
        assert!(interval.time >= 30.0);
        assert!(interval.time < 300.0);
        assert!(interval.average_watts > 212.5);
    }
    assert_eq!(ride.workout_type, WorkoutType::Race);
}

#[test]
fn test_long_efforts_are_intervals() {
    // 100 W base with 10-minute efforts at 300 W every 20 minutes
    let power = efforts(3600, 100.0, 300.0, 1200, 300, 600);
    let analyzer = RideAnalyzer::new(&AnalysisConfig::default());
    let ride = analyzer.analyze(flat_ride("Threshold", power), Some(300.0)).unwrap();

    assert_eq!(ride.intervals.len(), 3);
    assert!(ride.total_interval_time() > 1500.0);
    assert_eq!(ride.workout_type, WorkoutType::Intervals);
}

#[test]
fn test_climb_and_descent_are_found() {
    // 2 km up at 5%, then 2 km down at 5%, then 2 km flat, 10 m per sample
    let distance: Vec<f64> = (0..=600).map(|i| i as f64 * 10.0).collect();
    let altitude: Vec<f64> = distance
        .iter()
        .map(|&d| match d {
            d if d <= 2000.0 => d * 0.05,
            d if d <= 4000.0 => 100.0 - (d - 2000.0) * 0.05,
            _ => 0.0,
        })
        .collect();
    let len = distance.len();
    let streams = RideStreams::new(
        vec![200.0; len],
        altitude,
        distance,
        (0..len).map(|i| i as f64 * 2.0).collect(),
    );

    let hills = HillFinder::new(HillFinderConfig::default()).find_hills(&streams).unwrap();

    assert_eq!(hills.len(), 2);
    assert!(hills[0].is_climb());
    assert_eq!((hills[0].idx_start, hills[0].idx_end), (0, 200));
    assert!((hills[0].average_gradient - 0.05).abs() < 1e-9);
    assert!((hills[0].elevation_gain - 100.0).abs() < 1e-9);
    assert!(hills[1].is_descent());
    assert_eq!((hills[1].idx_start, hills[1].idx_end), (200, 400));
    assert!((hills[1].average_gradient + 0.05).abs() < 1e-9);
    assert!((hills[1].average_speed - 5.0).abs() < 1e-9);
}

#[test]
fn test_fragment_scenario() {
    let altitude = [0., 1., 2., 3., 4., 3., 2., 1., 0., 1., 2., 3., 4., 5., 6., 7., 8.];
    let distance: Vec<f64> = (0..altitude.len()).map(|i| i as f64).collect();
    let finder = HillFinder::new(HillFinderConfig {
        false_flat_distance: 1.0,
        hill_gap: 0.0,
        min_gradient: 0.02,
        min_hill_distance: 0.0,
    });

    let fragments = finder.find_fragments(&altitude, &distance);
    assert_eq!(fragments, vec![HillFragment::new(0, 4), HillFragment::new(4, 8)]);

    let culled = finder.cull_fragments(&altitude, &distance, &fragments);
    assert_eq!(culled, fragments);
}

#[test]
fn test_ride_records_from_json() {
    let json = r#"[
        {
            "name": "Morning Ride",
            "start_date": "2024-05-04T07:30:00Z",
            "streams": {
                "power": [150, 160, 0, 170, 165, 155, 150, 160, 170, 180],
                "altitude": [10, 10, 10, 10, 10, 10, 10, 10, 10, 10],
                "distance": [0, 8, 16, 24, 32, 40, 48, 56, 64, 72],
                "time": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]
            }
        }
    ]"#;

    let rides: Vec<Ride> = serde_json::from_str(json).unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].workout_type, WorkoutType::Unknown);
    assert!(rides[0].hills.is_empty());

    let summary = RideAnalyzer::new(&AnalysisConfig::default()).analyze_batch(rides, Some(250.0));
    assert!(summary.is_fully_successful());

    let ride = &summary.rides[0];
    assert_eq!(ride.workout_type, WorkoutType::Endurance);
    assert_eq!(ride.distance, 72.0);
    assert_eq!(ride.moving_time, 9.0);

    let output = serde_json::to_string(&summary.rides).unwrap();
    assert!(output.contains("\"workout_type\":\"Endurance\""));
    assert!(output.contains("\"terrain\""));
}

#[test]
fn test_malformed_ride_is_reported_not_fatal() {
    let mut broken = flat_ride("Dropouts", vec![200.0; 100]);
    broken.streams.time.pop();

    let summary = RideAnalyzer::new(&AnalysisConfig::default()).analyze_batch(
        vec![flat_ride("Good", vec![200.0; 100]), broken],
        Some(250.0),
    );

    assert_eq!(summary.rides.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, "Dropouts");
}

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = AnalysisConfig::default();
    config.hills.min_gradient = 0.03;
    config.intervals = IntervalFinderConfig::ride_average_profile();
    config.save_to_file(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[hills]"));
    assert!(text.contains("reference_power = \"ride_average\""));

    let loaded = AnalysisConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.intervals.reference_power, ReferencePower::RideAverage);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let mut text = toml::to_string_pretty(&AnalysisConfig::default()).unwrap();
    text = text.replace("search_chunk_size = 50", "search_chunk_size = 0");
    fs::write(&path, text).unwrap();

    let error = AnalysisConfig::load_from_file(&path).unwrap_err();
    assert!(error.to_string().contains("search_chunk_size"));

    fs::write(&path, "[hills]\nmin_gradient = \"steep\"\n").unwrap();
    assert!(AnalysisConfig::load_from_file(&path).is_err());
}

#[test]
fn test_ride_average_profile_finds_efforts_without_ftp() {
    let config = AnalysisConfig {
        intervals: IntervalFinderConfig::ride_average_profile(),
        ..AnalysisConfig::default()
    };
    // ride average is 210 W, so efforts must clear 283.5 W
    let power = efforts(3600, 120.0, 300.0, 1200, 300, 600);

    let ride = RideAnalyzer::new(&config)
        .analyze(flat_ride("No power meter calibration", power), None)
        .unwrap();

    assert_eq!(ride.intervals.len(), 3);
    assert_eq!(ride.workout_type, WorkoutType::Unknown);
}

#[test]
fn test_ride_file_round_trip_through_analysis() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("rides.json");
    let output = temp_dir.path().join("classified.json");

    write_rides(&input, &[flat_ride("Recovery", vec![100.0; 600])]).unwrap();
    let rides = read_rides(&input).unwrap();

    let summary = RideAnalyzer::new(&AnalysisConfig::default()).analyze_batch(rides, Some(-200.0));
    assert!(summary.is_fully_successful());
    assert_eq!(summary.rides[0].workout_type, WorkoutType::Unknown);

    write_rides(&output, &summary.rides).unwrap();
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("\"terrain\""));
    assert_eq!(read_rides(&output).unwrap()[0].name, "Recovery");
}
