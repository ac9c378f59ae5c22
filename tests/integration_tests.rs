use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;

use objchop_cli::adapters::{InterleavedSource, JsonDocumentStore, WavFileSource};
use objchop_cli::app::{ChopInteractor, ChopRequest};
use objchop_cli::domain::model::{AnalyserSettings, ProductionProfileLimits, NS_PER_MS};
use objchop_cli::planner::Resolution;
use objchop_cli::ports::DocumentStore;
use objchop_cli::*;

/// Test utilities for building documents and sample files
mod test_utils {
    use super::*;

    pub const RATE: u32 = 48_000;
    pub const FRAMES: usize = 48_000;

    /// Two objects over one second: `Voice` on channel 0, `Music` on channel 1
    pub fn document() -> Value {
        let channel = |value: &str, name: &str| {
            json!({
                "id": format!("AC_0003{}", value),
                "name": name,
                "blocks": {"type": "objects", "items": [
                    {"id": format!("AB_0003{}_00000001", value), "rtime_ns": 0, "duration_ns": 500_000_000,
                     "position": {"coordinate": "polar", "azimuth": -30.0, "elevation": 0.0}},
                    {"id": format!("AB_0003{}_00000002", value), "rtime_ns": 500_000_000, "duration_ns": 500_000_000,
                     "position": {"coordinate": "polar", "azimuth": 30.0, "elevation": 0.0}}
                ]}
            })
        };
        json!({
            "document": {
                "objects": [
                    {"id": "AO_1001", "name": "Voice", "start_ns": 0, "duration_ns": 1_000_000_000,
                     "pack_refs": ["AP_00031001"], "track_uid_refs": ["ATU_00000001"]},
                    {"id": "AO_1002", "name": "Music", "start_ns": 0, "duration_ns": 1_000_000_000,
                     "pack_refs": ["AP_00031002"], "track_uid_refs": ["ATU_00000002"]}
                ],
                "pack_formats": [
                    {"id": "AP_00031001", "name": "Voice", "channel_refs": ["AC_00031001"]},
                    {"id": "AP_00031002", "name": "Music", "channel_refs": ["AC_00031002"]}
                ],
                "channel_formats": [channel("1001", "Voice"), channel("1002", "Music")],
                "track_uids": [
                    {"id": "ATU_00000001", "channel_ref": "AC_00031001", "pack_ref": "AP_00031001"},
                    {"id": "ATU_00000002", "channel_ref": "AC_00031002", "pack_ref": "AP_00031002"}
                ]
            },
            "channel_map": [
                {"track_uid": "ATU_00000001", "channel": 0},
                {"track_uid": "ATU_00000002", "channel": 1}
            ]
        })
    }

    /// Channel 0 sounds over [0.2 s, 0.4 s); channel 1 throughout
    pub fn samples() -> Vec<f32> {
        let mut out = Vec::with_capacity(FRAMES * 2);
        for frame in 0..FRAMES {
            out.push(if (9_600..19_200).contains(&frame) { 0.5 } else { 0.0 });
            out.push(0.25);
        }
        out
    }

    /// Write a 32-bit float WAV file using `hound`
    pub fn write_wav(path: &Path, samples: &[f32], channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: RATE,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    /// Write `<name>.json` and `<name>.wav` into `dir`
    pub fn write_pair(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
        let doc = dir.join(format!("{}.json", name));
        let wav = dir.join(format!("{}.wav", name));
        fs::write(&doc, serde_json::to_string_pretty(&document()).unwrap()).unwrap();
        write_wav(&wav, &samples(), 2);
        (doc, wav)
    }

    pub fn tight_limits() -> ProductionProfileLimits {
        ProductionProfileLimits {
            min_gap_ns: 100 * NS_PER_MS,
            lead_in_ns: 0,
            lead_out_ns: 0,
            min_duration_ns: 0,
            max_gap_ns: 5000 * NS_PER_MS,
            crop_objects: true,
        }
    }

    pub fn settings() -> AnalyserSettings {
        AnalyserSettings {
            block_size: 480,
            ..AnalyserSettings::default()
        }
    }

    /// The binary, run inside `dir` so no stray config file is picked up
    pub fn objchop(dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("objchop").unwrap();
        cmd.current_dir(dir)
            .env_remove("RUST_LOG")
            .env_remove("OBJCHOP_CONFIG")
            .env_remove("OBJCHOP_PROFILE")
            .env_remove("OBJCHOP_LEAD_IN")
            .env_remove("OBJCHOP_LEAD_OUT")
            .env_remove("OBJCHOP_MIN_GAP")
            .env_remove("OBJCHOP_MIN_DURATION")
            .env_remove("OBJCHOP_MAX_GAP")
            .env_remove("OBJCHOP_THRESHOLD")
            .env_remove("OBJCHOP_LOG_LEVEL");
        cmd
    }

    pub fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    pub fn object<'a>(doc: &'a Value, id: &str) -> &'a Value {
        doc["document"]["objects"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["id"] == id)
            .unwrap()
    }
}

use test_utils::*;

#[test]
fn test_library_pipeline_trims_voice_and_keeps_music() {
    let dir = TempDir::new().unwrap();
    let (doc, wav) = write_pair(dir.path(), "scene");
    let output = dir.path().join("out").join("scene.json");
    let report = dir.path().join("out").join("scene.report.json");

    let interactor = ChopInteractor::new(Arc::new(JsonDocumentStore::new()), settings(), tight_limits());
    let mut source = WavFileSource::open(&wav, 480).unwrap();
    let response = interactor
        .chop(
            &ChopRequest {
                document: doc,
                output: output.clone(),
                report: Some(report.clone()),
            },
            &mut source,
        )
        .unwrap();

    assert_eq!(
        response.report.objects[0].resolution,
        Resolution::Trimmed {
            interval: Interval::new(200 * NS_PER_MS, 400 * NS_PER_MS).unwrap()
        }
    );
    assert_eq!(response.report.objects[1].resolution, Resolution::Unchanged);

    let bundle = JsonDocumentStore::new().load(&output).unwrap();
    assert_eq!(bundle.document.objects.len(), 2);

    let written = read_json(&report);
    assert_eq!(written["objects"][0]["resolution"]["action"], "trimmed");
    assert!(written["generated_at"].is_string());
}

#[test]
fn test_in_memory_source_gives_same_plan_as_file() {
    let dir = TempDir::new().unwrap();
    let (doc, wav) = write_pair(dir.path(), "scene");
    let interactor = ChopInteractor::new(Arc::new(JsonDocumentStore::new()), settings(), tight_limits());

    let mut from_file = WavFileSource::open(&wav, 480).unwrap();
    let mut in_memory = InterleavedSource::new(samples(), 2, RATE, 480).unwrap();
    let (_, a) = interactor.plan(&doc, &mut from_file).unwrap();
    let (_, b) = interactor.plan(&doc, &mut in_memory).unwrap();
    assert_eq!(a.entries(), b.entries());
}

#[test]
fn test_cli_chop_writes_document_and_report() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "scene");

    objchop(dir.path())
        .args([
            "chop",
            "--document",
            "scene.json",
            "--samples",
            "scene.wav",
            "--block-size",
            "480",
            "--output",
            "chopped.json",
            "--report",
            "report.json",
            "--lead-in",
            "0ms",
            "--lead-out",
            "0ms",
            "--min-duration",
            "0",
            "--min-gap",
            "100ms",
        ])
        .assert()
        .success();

    let out = read_json(&dir.path().join("chopped.json"));
    let voice = object(&out, "AO_1001");
    assert_eq!(voice["start_ns"], 200_000_000);
    assert_eq!(voice["duration_ns"], 200_000_000);
    assert_eq!(object(&out, "AO_1002")["duration_ns"], 1_000_000_000);

    let report = read_json(&dir.path().join("report.json"));
    assert_eq!(report["trimmed_channels"], json!(["AC_00031001"]));
}

#[test]
fn test_cli_plan_json_uses_profile_defaults() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "scene");

    let output = objchop(dir.path())
        .args([
            "plan", "--document", "scene.json", "--samples", "scene.wav", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    // Default profile pads by 20 ms on each side
    let entries: Value = serde_json::from_slice(&output.stdout).unwrap();
    let voice = &entries[0]["resolution"];
    assert_eq!(voice["action"], "trimmed");
    let interval = &voice["interval"];
    assert!(interval["start"].as_i64().unwrap() <= 180_000_000);
    assert!(interval["end"].as_i64().unwrap() >= 420_000_000);
}

#[test]
fn test_cli_reads_config_file_and_env_overrides_it() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "scene");
    fs::write(
        dir.path().join("objchop.toml"),
        "profile = \"tight\"\n[profiles.tight]\nlead_in_ns = 0\nlead_out_ns = 0\nmin_duration_ns = 0\nmin_gap_ns = 100000000\n[analyser]\nblock_size = 480\n",
    )
    .unwrap();

    let plan = |cmd: &mut Command| -> Value {
        let output = cmd
            .args([
                "plan", "--document", "scene.json", "--samples", "scene.wav", "--json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    };

    let from_file = plan(&mut objchop(dir.path()));
    assert_eq!(from_file[0]["resolution"]["interval"]["start"], 200_000_000);

    let from_env = plan(objchop(dir.path()).env("OBJCHOP_LEAD_IN", "50ms"));
    assert_eq!(from_env[0]["resolution"]["interval"]["start"], 150_000_000);
}

#[test]
fn test_cli_batch_processes_every_pair() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(input.join("day2")).unwrap();
    write_pair(&input, "first");
    write_pair(&input.join("day2"), "second");

    objchop(dir.path())
        .args([
            "batch",
            "--dir",
            "in",
            "--output-dir",
            "out",
        ])
        .assert()
        .success();

    for name in ["first", "second"] {
        assert!(dir.path().join("out").join(format!("{}.json", name)).is_file());
        assert!(dir.path().join("out").join(format!("{}.report.json", name)).is_file());
    }
}

#[test]
fn test_cli_rejects_bad_arguments() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "scene");

    objchop(dir.path())
        .args(["analyse", "--samples", "scene.wav", "--block-size", "0"])
        .assert()
        .failure();

    objchop(dir.path())
        .args(["analyse", "--samples", "missing.wav"])
        .assert()
        .failure();

    objchop(dir.path())
        .args([
            "plan", "--document", "scene.json", "--samples", "scene.wav", "--profile", "nope",
        ])
        .assert()
        .failure();
}

#[test]
fn test_cli_analyse_prints_blocks() {
    let dir = TempDir::new().unwrap();
    write_pair(dir.path(), "scene");

    let output = objchop(dir.path())
        .args(["analyse", "--samples", "scene.wav", "--block-size", "4800"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Ten 100 ms blocks, the terminal block and the length line
    assert_eq!(lines.len(), 12);
    assert!(lines[0].ends_with(".#"));
    assert!(lines[2].ends_with("##"));
    assert!(lines[10].ends_with(".."));
}
