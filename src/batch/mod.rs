//! Batch orchestration over many rasters of one roll.
//!
//! A batch runs in three stages:
//! 1. per-image detection on a bounded worker pool, each task loading its
//!    own raster through a [`RasterStore`];
//! 2. a sequential barrier that rejects outliers against batch medians and
//!    estimates principal points;
//! 3. per-image restitution and QC, again on the pool.
//!
//! Configuration problems are reported before any task is dispatched.
//! Everything that goes wrong inside a task becomes a failed row.

mod store;

pub use store::RasterStore;
#[cfg(feature = "image-io")]
pub use store::FsRasterStore;

use crate::bank::CompiledTemplate;
use crate::fiducial::{
    detect_fiducial_proxies, detect_fiducials, merge_principal_points, principal_point_from_pairs,
    principal_point_from_proxies, reject_low_scores, reject_offset_proxies, Confidence, DetectConfig,
    FiducialSet, FiducialTemplates, FrameDetection, OutlierConfig, ProxyConfig,
};
use crate::geometry::{FiducialLayout, Point};
use crate::qc::{QcRecord, QcTable};
use crate::restitution::{restitute, RestitutionConfig};
use crate::search::MatchConfig;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::transform::{AffineTransform, CanonicalGeometry};
use crate::util::{AerofidError, AerofidResult};
use rayon::prelude::*;

/// Worker pool configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl BatchConfig {
    pub fn validate(&self) -> AerofidResult<()> {
        if self.workers == Some(0) {
            return Err(AerofidError::InvalidConfig {
                field: "workers",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Effective number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    fn pool(&self) -> AerofidResult<rayon::ThreadPool> {
        self.validate()?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count())
            .build()
            .map_err(|_| AerofidError::InvalidConfig {
                field: "workers",
                reason: "thread pool could not be started",
            })
    }
}

/// Midside and/or corner markers matched with fiducial templates.
#[derive(Clone, Debug)]
pub struct FiducialJob {
    pub midside: Option<FiducialTemplates>,
    pub corner: Option<FiducialTemplates>,
    pub detect: DetectConfig,
    pub outlier: OutlierConfig,
}

/// Film-holder edges matched with one template per side.
#[derive(Clone, Debug)]
pub struct ProxyJob {
    /// Templates in `left, top, right, bottom` order.
    pub templates: [CompiledTemplate; 4],
    pub matching: MatchConfig,
    pub proxy: ProxyConfig,
}

/// What the detection stage looks for.
#[derive(Clone, Debug)]
pub enum Detector {
    Fiducials(FiducialJob),
    Proxies(ProxyJob),
}

impl Detector {
    fn validate(&self) -> AerofidResult<()> {
        match self {
            Detector::Fiducials(job) => {
                if job.midside.is_none() && job.corner.is_none() {
                    return Err(AerofidError::InvalidConfig {
                        field: "templates",
                        reason: "need midside or corner templates",
                    });
                }
                job.detect.validate()?;
                job.outlier.validate()
            }
            Detector::Proxies(job) => {
                job.matching.validate()?;
                job.proxy.validate()
            }
        }
    }

    /// Checks that every template fits its window on a raster of this size.
    pub fn check_raster_size(&self, height: usize, width: usize) -> AerofidResult<()> {
        match self {
            Detector::Fiducials(job) => {
                for templates in [&job.midside, &job.corner].into_iter().flatten() {
                    templates.check_raster_size(height, width)?;
                }
                Ok(())
            }
            Detector::Proxies(job) => {
                let pad = 2 * job.proxy.buffer;
                let windows = FiducialLayout::Midside.windows(height + pad, width + pad)?;
                for (window, tpl) in windows.iter().zip(&job.templates) {
                    if tpl.width() > window.width() || tpl.height() > window.height() {
                        return Err(AerofidError::TemplateTooLarge {
                            tpl_width: tpl.width(),
                            tpl_height: tpl.height(),
                            region_width: window.width(),
                            region_height: window.height(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    fn detect(&self, store: &dyn RasterStore, id: &str) -> AerofidResult<Vec<FiducialSet>> {
        let raster = store.load(id)?.with_id(id);
        self.check_raster_size(raster.height(), raster.width())?;
        match self {
            Detector::Fiducials(job) => [&job.midside, &job.corner]
                .into_iter()
                .flatten()
                .map(|templates| detect_fiducials(&raster, templates, &job.detect))
                .collect(),
            Detector::Proxies(job) => Ok(vec![detect_fiducial_proxies(
                &raster,
                &job.templates,
                &job.matching,
                &job.proxy,
            )?]),
        }
    }
}

/// One row of the detection table.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionRow {
    pub detection: FrameDetection,
    /// Why the image could not be processed; the detection is empty then.
    pub failure: Option<String>,
}

impl DetectionRow {
    pub fn id(&self) -> &str {
        &self.detection.id
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// One row of the restitution table.
#[derive(Clone, Debug, PartialEq)]
pub struct RestitutionRow {
    pub id: String,
    pub transform: Option<AffineTransform>,
    /// Marker points after restitution, in frame slot order.
    pub points: [Option<Point>; 8],
    pub principal_point: Option<Point>,
    /// Location of the written raster, if one was produced.
    pub output: Option<String>,
    pub failure: Option<String>,
}

impl RestitutionRow {
    fn failed(id: &str, reason: String) -> Self {
        Self {
            id: id.to_string(),
            transform: None,
            points: [None; 8],
            principal_point: None,
            output: None,
            failure: Some(reason),
        }
    }
}

/// Restitution rows and the QC table of one batch.
#[derive(Clone, Debug)]
pub struct RestitutionReport {
    pub rows: Vec<RestitutionRow>,
    /// Present when QC was requested.
    pub qc: Option<QcTable>,
}

/// Runs detection, batch scoring and principal point estimation.
///
/// Returns one row per identity, sorted by identity.
pub fn run_detection(
    ids: &[String],
    store: &dyn RasterStore,
    detector: &Detector,
    cfg: &BatchConfig,
) -> AerofidResult<Vec<DetectionRow>> {
    detector.validate()?;
    let pool = cfg.pool()?;
    let _span = trace_span!("run_detection", images = ids.len()).entered();

    // Preflight on the first readable raster so that oversized templates
    // fail the batch instead of every row.
    for id in ids {
        match store.load(id) {
            Ok(raster) => {
                detector.check_raster_size(raster.height(), raster.width())?;
                break;
            }
            Err(err) => {
                trace_warn!("preflight raster unreadable", id = id.as_str(), error = err.to_string().as_str());
            }
        }
    }

    let mut results: Vec<(String, AerofidResult<Vec<FiducialSet>>)> = pool.install(|| {
        ids.par_iter()
            .map(|id| (id.clone(), detector.detect(store, id)))
            .collect()
    });
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut rows = Vec::with_capacity(results.len());
    let mut sets = Vec::new();
    let mut owners = Vec::new();
    for (index, (id, result)) in results.into_iter().enumerate() {
        let failure = match result {
            Ok(found) => {
                owners.extend(std::iter::repeat(index).take(found.len()));
                sets.extend(found);
                None
            }
            Err(err) => {
                trace_warn!("detection failed", id = id.as_str(), error = err.to_string().as_str());
                Some(err.to_string())
            }
        };
        rows.push(DetectionRow {
            detection: FrameDetection::new(id),
            failure,
        });
    }

    match detector {
        Detector::Fiducials(job) => {
            let medians = reject_low_scores(&mut sets, &job.outlier)?;
            let mut estimates = vec![[None::<Point>; 2]; rows.len()];
            for (set, &owner) in sets.iter().zip(&owners) {
                let pp = principal_point_from_pairs(set, &medians, job.outlier.threshold);
                let which = usize::from(set.layout == FiducialLayout::Corner);
                estimates[owner][which] = pp;
                rows[owner].detection = rows[owner].detection.clone().with_set(set);
            }
            for (row, [midside, corner]) in rows.iter_mut().zip(estimates) {
                let pp = merge_principal_points(midside, corner);
                row.detection = row.detection.clone().with_principal_point(pp, Confidence::Full);
            }
        }
        Detector::Proxies(job) => {
            reject_offset_proxies(&mut sets, &job.proxy)?;
            for (set, &owner) in sets.iter().zip(&owners) {
                let estimate = principal_point_from_proxies(set);
                let row = &mut rows[owner];
                row.detection = row.detection.clone().with_set(set).with_principal_point(
                    estimate.map(|e| e.point),
                    estimate.map_or(Confidence::Full, |e| e.confidence),
                );
            }
        }
    }

    trace_event!(
        "detection finished",
        images = rows.len(),
        failed = rows.iter().filter(|r| r.is_failed()).count()
    );
    Ok(rows)
}

/// Restitutes every successfully detected frame and collects QC.
///
/// Rasters are only loaded when the config resamples or crops. Rows that
/// failed detection stay failed. Returns rows sorted by identity.
pub fn run_restitution(
    detections: &[DetectionRow],
    store: &dyn RasterStore,
    canonical: &CanonicalGeometry,
    restitution: &RestitutionConfig,
    cfg: &BatchConfig,
) -> AerofidResult<RestitutionReport> {
    restitution.validate()?;
    let pool = cfg.pool()?;
    let _span = trace_span!("run_restitution", images = detections.len()).entered();

    let mut results: Vec<(RestitutionRow, Option<QcRecord>)> = pool.install(|| {
        detections
            .par_iter()
            .map(|row| match &row.failure {
                Some(reason) => (
                    RestitutionRow::failed(row.id(), reason.clone()),
                    failed_qc(row.id(), restitution),
                ),
                None => match restitute_one(&row.detection, store, canonical, restitution) {
                    Ok(done) => done,
                    Err(err) => {
                        trace_warn!("restitution failed", id = row.id(), error = err.to_string().as_str());
                        (
                            RestitutionRow::failed(row.id(), err.to_string()),
                            failed_qc(row.id(), restitution),
                        )
                    }
                },
            })
            .collect()
    });
    results.sort_by(|a, b| a.0.id.cmp(&b.0.id));

    let (rows, records): (Vec<_>, Vec<_>) = results.into_iter().unzip();
    let qc = restitution
        .compute_qc
        .then(|| QcTable::new(records.into_iter().flatten().collect()));
    Ok(RestitutionReport { rows, qc })
}

fn failed_qc(id: &str, cfg: &RestitutionConfig) -> Option<QcRecord> {
    cfg.compute_qc.then(|| QcRecord {
        id: id.to_string(),
        ..QcRecord::default()
    })
}

fn restitute_one(
    detection: &FrameDetection,
    store: &dyn RasterStore,
    canonical: &CanonicalGeometry,
    cfg: &RestitutionConfig,
) -> AerofidResult<(RestitutionRow, Option<QcRecord>)> {
    let raster = if cfg.writes_raster() {
        Some(store.load(&detection.id)?.with_id(detection.id.as_str()))
    } else {
        None
    };
    let done = restitute(detection, raster.as_ref(), canonical, cfg)?;
    let output = done.raster.as_ref().map(|r| store.save(r)).transpose()?;
    let row = RestitutionRow {
        id: done.id,
        transform: done.transform,
        points: done.points,
        principal_point: done.principal_point,
        output,
        failure: None,
    };
    Ok((row, done.qc))
}
