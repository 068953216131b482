use aerofid::batch::FsRasterStore;
use aerofid::io::load_template;
use aerofid::qc::MetricSummary;
use aerofid::{
    run_detection, run_restitution, BatchConfig, CanonicalGeometry, CompileConfig, CompiledTemplate,
    Confidence, DetectConfig, DetectionRow, Detector, FiducialJob, FiducialLayout, FiducialTemplates,
    FrameDetection, InterpolationOrder, Marker, MarkerSlot, MatchConfig, OutlierConfig, Point,
    ProxyConfig, ProxyJob, QcRecord, RestitutionConfig, RestitutionRow, SubpixelConfig,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Aerofid CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StepsJson {
    detect: bool,
    transform_coords: bool,
    transform_image: bool,
    crop: bool,
    qc: bool,
}

impl Default for StepsJson {
    fn default() -> Self {
        Self {
            detect: true,
            transform_coords: true,
            transform_image: true,
            crop: true,
            qc: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TemplatesJson {
    midside: Option<String>,
    midside_high_res: Option<String>,
    corner: Option<String>,
    corner_high_res: Option<String>,
    /// Left, top, right and bottom proxy templates; replaces fiducial
    /// detection when set.
    proxies: Option<[String; 4]>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    min_var: f64,
    pyramid_levels: usize,
    beam_width: usize,
    per_level_topk: usize,
    nms_radius: usize,
    roi_radius: usize,
    parallel: bool,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            min_var: cfg.min_var,
            pyramid_levels: cfg.pyramid_levels,
            beam_width: cfg.beam_width,
            per_level_topk: cfg.per_level_topk,
            nms_radius: cfg.nms_radius,
            roi_radius: cfg.roi_radius,
            parallel: cfg.parallel,
        }
    }
}

impl From<&MatchConfigJson> for MatchConfig {
    fn from(value: &MatchConfigJson) -> Self {
        Self {
            min_var: value.min_var,
            pyramid_levels: value.pyramid_levels,
            beam_width: value.beam_width,
            per_level_topk: value.per_level_topk,
            nms_radius: value.nms_radius,
            roi_radius: value.roi_radius,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SubpixelConfigJson {
    distance_from_loc: usize,
    factor: usize,
    search_radius: Option<usize>,
    min_var: f64,
}

impl Default for SubpixelConfigJson {
    fn default() -> Self {
        let cfg = SubpixelConfig::default();
        Self {
            distance_from_loc: cfg.distance_from_loc,
            factor: cfg.factor,
            search_radius: cfg.search_radius,
            min_var: cfg.min_var,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ProxyConfigJson {
    buffer: usize,
    offset_threshold_px: f64,
    missing_proxy: Option<String>,
}

impl Default for ProxyConfigJson {
    fn default() -> Self {
        let cfg = ProxyConfig::default();
        Self {
            buffer: cfg.buffer,
            offset_threshold_px: cfg.offset_threshold_px,
            missing_proxy: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    images: Vec<String>,
    output_dir: String,
    output_path: Option<String>,
    /// Detection table read instead of detecting when `steps.detect` is off.
    detections_path: Option<String>,
    scanning_resolution_mm: f64,
    /// Calibrated `[x, y]` marker positions in millimeters, keyed by slot label.
    canonical_mm: BTreeMap<String, [f64; 2]>,
    output_size: usize,
    interpolation_order: u8,
    outlier_threshold: f64,
    workers: Option<usize>,
    steps: StepsJson,
    templates: TemplatesJson,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
    subpixel: SubpixelConfigJson,
    proxy: ProxyConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        let restitution = RestitutionConfig::default();
        Self {
            images: Vec::new(),
            output_dir: "output".to_string(),
            output_path: None,
            detections_path: None,
            scanning_resolution_mm: restitution.scanning_resolution_mm,
            canonical_mm: BTreeMap::new(),
            output_size: restitution.output_size,
            interpolation_order: restitution.interpolation.order() as u8,
            outlier_threshold: OutlierConfig::default().threshold,
            workers: None,
            steps: StepsJson::default(),
            templates: TemplatesJson::default(),
            match_cfg: MatchConfigJson::default(),
            subpixel: SubpixelConfigJson::default(),
            proxy: ProxyConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
}

impl From<Point> for PointRecord {
    fn from(value: Point) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<PointRecord> for Point {
    fn from(value: PointRecord) -> Self {
        Point::new(value.y, value.x)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MarkerRecord {
    slot: String,
    x: Option<f64>,
    y: Option<f64>,
    score: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ConfidenceRecord {
    Full,
    Reduced,
}

#[derive(Debug, Serialize, Deserialize)]
struct DetectionRecord {
    id: String,
    markers: Vec<MarkerRecord>,
    principal_point: Option<PointRecord>,
    confidence: Option<ConfidenceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl From<&DetectionRow> for DetectionRecord {
    fn from(value: &DetectionRow) -> Self {
        let det = &value.detection;
        let markers = MarkerSlot::ALL
            .iter()
            .map(|&slot| {
                let m = det.marker(slot);
                MarkerRecord {
                    slot: slot.label().to_string(),
                    x: m.point.map(|p| p.x),
                    y: m.point.map(|p| p.y),
                    score: m.score,
                }
            })
            .collect();
        Self {
            id: det.id.clone(),
            markers,
            principal_point: det.principal_point.map(PointRecord::from),
            confidence: det.confidence.map(|c| match c {
                Confidence::Full => ConfidenceRecord::Full,
                Confidence::Reduced => ConfidenceRecord::Reduced,
            }),
            failure: value.failure.clone(),
        }
    }
}

impl TryFrom<DetectionRecord> for DetectionRow {
    type Error = String;

    fn try_from(value: DetectionRecord) -> Result<Self, Self::Error> {
        let mut detection = FrameDetection::new(value.id);
        for record in value.markers {
            let slot = MarkerSlot::from_label(&record.slot)
                .ok_or_else(|| format!("unknown marker slot `{}`", record.slot))?;
            let point = match (record.y, record.x) {
                (Some(y), Some(x)) => Some(Point::new(y, x)),
                _ => None,
            };
            detection.markers[slot.frame_index()] = Marker {
                point,
                score: record.score,
            };
        }
        let confidence = match value.confidence {
            Some(ConfidenceRecord::Reduced) => Confidence::Reduced,
            _ => Confidence::Full,
        };
        let detection =
            detection.with_principal_point(value.principal_point.map(Point::from), confidence);
        Ok(Self {
            detection,
            failure: value.failure,
        })
    }
}

#[derive(Debug, Serialize)]
struct RestitutionRecord {
    id: String,
    /// `[a, b, tx, c, d, ty]` mapping detected `(x, y)` to canonical.
    transform: Option<[f64; 6]>,
    points: BTreeMap<&'static str, Option<PointRecord>>,
    principal_point: Option<PointRecord>,
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl From<&RestitutionRow> for RestitutionRecord {
    fn from(value: &RestitutionRow) -> Self {
        Self {
            id: value.id.clone(),
            transform: value.transform.map(|tf| tf.params()),
            points: MarkerSlot::ALL
                .iter()
                .map(|&slot| (slot.label(), value.points[slot.frame_index()].map(PointRecord::from)))
                .collect(),
            principal_point: value.principal_point.map(PointRecord::from),
            output: value.output.clone(),
            failure: value.failure.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct QcRecordJson {
    id: String,
    #[serde(flatten)]
    metrics: BTreeMap<&'static str, Option<f64>>,
}

impl From<&QcRecord> for QcRecordJson {
    fn from(value: &QcRecord) -> Self {
        Self {
            id: value.id.clone(),
            metrics: QcRecord::METRICS.into_iter().zip(value.values()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    metric: &'static str,
    count: usize,
    mean: Option<f64>,
    median: Option<f64>,
    max: Option<f64>,
}

impl From<&MetricSummary> for SummaryRecord {
    fn from(value: &MetricSummary) -> Self {
        Self {
            metric: value.name,
            count: value.count,
            mean: value.mean,
            median: value.median,
            max: value.max,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    detections: Vec<DetectionRecord>,
    restitution: Vec<RestitutionRecord>,
    qc: Vec<QcRecordJson>,
    qc_summary: Vec<SummaryRecord>,
}

fn canonical_geometry(config: &Config) -> Result<CanonicalGeometry, Box<dyn std::error::Error>> {
    let mut table = [None; 8];
    for (label, [x_mm, y_mm]) in &config.canonical_mm {
        let slot = MarkerSlot::from_label(label)
            .ok_or_else(|| format!("unknown marker slot `{label}` in canonical_mm"))?;
        table[slot.frame_index()] = Some((*x_mm, *y_mm));
    }
    Ok(CanonicalGeometry::from_mm(table, config.scanning_resolution_mm)?)
}

fn build_detector(config: &Config) -> Result<Detector, Box<dyn std::error::Error>> {
    let matching = MatchConfig::from(&config.match_cfg);
    let compile_cfg = CompileConfig {
        max_levels: matching.pyramid_levels,
        ..CompileConfig::default()
    };

    if let Some(paths) = &config.templates.proxies {
        let mut templates = Vec::with_capacity(4);
        for path in paths {
            templates.push(CompiledTemplate::compile(&load_template(path)?, &compile_cfg)?);
        }
        let templates: [CompiledTemplate; 4] = templates
            .try_into()
            .map_err(|_| "expected four proxy templates")?;
        let missing_proxy = match &config.proxy.missing_proxy {
            Some(label) => Some(
                MarkerSlot::from_label(label).ok_or_else(|| format!("unknown marker slot `{label}`"))?,
            ),
            None => None,
        };
        return Ok(Detector::Proxies(ProxyJob {
            templates,
            matching,
            proxy: ProxyConfig {
                buffer: config.proxy.buffer,
                offset_threshold_px: config.proxy.offset_threshold_px,
                missing_proxy,
            },
        }));
    }

    let detect = DetectConfig {
        matching,
        subpixel: SubpixelConfig {
            distance_from_loc: config.subpixel.distance_from_loc,
            factor: config.subpixel.factor,
            order: InterpolationOrder::from_order(config.interpolation_order)?,
            search_radius: config.subpixel.search_radius,
            min_var: config.subpixel.min_var,
        },
    };
    let compile = |layout, coarse: &Option<String>, high_res: &Option<String>| {
        coarse
            .as_ref()
            .map(|path| -> Result<FiducialTemplates, Box<dyn std::error::Error>> {
                let coarse = load_template(path)?;
                let high_res = high_res.as_ref().map(load_template).transpose()?;
                Ok(FiducialTemplates::compile(layout, &coarse, high_res.as_ref(), &detect)?)
            })
            .transpose()
    };
    let midside = compile(
        FiducialLayout::Midside,
        &config.templates.midside,
        &config.templates.midside_high_res,
    )?;
    let corner = compile(
        FiducialLayout::Corner,
        &config.templates.corner,
        &config.templates.corner_high_res,
    )?;
    Ok(Detector::Fiducials(FiducialJob {
        midside,
        corner,
        detect,
        outlier: OutlierConfig {
            threshold: config.outlier_threshold,
        },
    }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("aerofid=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.images.is_empty() && config.steps.detect {
        return Err("images must list at least one raster".into());
    }

    let batch = BatchConfig {
        workers: config.workers,
    };
    let store = FsRasterStore::new(&config.output_dir);

    let detections: Vec<DetectionRow> = if config.steps.detect {
        let detector = build_detector(&config)?;
        run_detection(&config.images, &store, &detector, &batch)?
    } else {
        let path = config
            .detections_path
            .as_ref()
            .ok_or("detections_path must be set when steps.detect is false")?;
        let records: Vec<DetectionRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
        records
            .into_iter()
            .map(DetectionRow::try_from)
            .collect::<Result<_, _>>()?
    };

    let steps = &config.steps;
    let restitution_cfg = RestitutionConfig {
        scanning_resolution_mm: config.scanning_resolution_mm,
        transform_coords: steps.transform_coords,
        transform_image: steps.transform_image,
        crop_image: steps.crop,
        output_size: config.output_size,
        interpolation: InterpolationOrder::from_order(config.interpolation_order)?,
        compute_qc: steps.qc,
    };
    let restitute = steps.transform_coords || steps.transform_image || steps.crop || steps.qc;
    let report = if restitute {
        let canonical = canonical_geometry(&config)?;
        Some(run_restitution(&detections, &store, &canonical, &restitution_cfg, &batch)?)
    } else {
        None
    };

    let (restitution, qc, qc_summary) = match &report {
        Some(report) => (
            report.rows.iter().map(RestitutionRecord::from).collect(),
            report
                .qc
                .iter()
                .flat_map(|table| table.rows().iter().map(QcRecordJson::from))
                .collect(),
            report
                .qc
                .iter()
                .flat_map(|table| table.summary())
                .map(|s| SummaryRecord::from(&s))
                .collect(),
        ),
        None => (Vec::new(), Vec::new(), Vec::new()),
    };
    let output = Output {
        detections: detections.iter().map(DetectionRecord::from).collect(),
        restitution,
        qc,
        qc_summary,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
