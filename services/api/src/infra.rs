use metrics_exporter_prometheus::PrometheusHandle;
use recruit_ai::interview::{ArchiveError, FinalReport, SessionArchive};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps final interview reports in process memory until a durable store is wired in.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionArchive {
    reports: Arc<Mutex<Vec<FinalReport>>>,
}

impl SessionArchive for InMemorySessionArchive {
    fn archive(&self, report: &FinalReport) -> Result<(), ArchiveError> {
        let mut guard = self.reports.lock().expect("archive mutex poisoned");
        guard.push(report.clone());
        info!(
            session_id = %report.session_id,
            archived = guard.len(),
            "interview report archived"
        );
        Ok(())
    }
}

impl InMemorySessionArchive {
    pub(crate) fn reports(&self) -> Vec<FinalReport> {
        self.reports.lock().expect("archive mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recruit_ai::interview::{InterviewSession, SessionId};

    #[test]
    fn archive_retains_reports_in_order() {
        let archive = InMemorySessionArchive::default();
        for id in ["first", "second"] {
            let session = InterviewSession::new(SessionId::from(id), Utc::now());
            let report = session.into_final_report(Utc::now());
            archive.archive(&report).expect("archived");
        }

        let ids: Vec<_> = archive
            .reports()
            .into_iter()
            .map(|report| report.session_id.0)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
