use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

struct SampleRunbook {
    title: &'static str,
    last_reviewed: &'static str,
    applies_to: &'static str,
    content: &'static str,
}

const SAMPLE_RUNBOOKS: &[SampleRunbook] = &[
    SampleRunbook {
        title: "Database Connection Failure",
        last_reviewed: "2024-01-15",
        applies_to: "payment-service, inventory-service",
        content: "## Symptoms
- Payment service reports 'database timeout'
- Connection pool exhaustion errors

## Steps
1. Check database server health: `ping db.internal`
2. Verify connection limits: `SHOW max_connections;`
3. Restart database service: `sudo systemctl restart postgresql`
4. If problem persists, increase connection pool size in config.",
    },
    SampleRunbook {
        title: "High CPU Usage on Application Server",
        last_reviewed: "2023-11-20",
        applies_to: "web-server, api-server",
        content: "## Symptoms
- CPU > 90% for extended period
- Slow response times

## Steps
1. Identify top processes: `top -b -n 1 | head -20`
2. Check for unusual process names or resource leaks.
3. Restart the application service: `sudo systemctl restart myapp`
4. If recurring, consider scaling horizontally.",
    },
    SampleRunbook {
        title: "API Timeout Errors",
        last_reviewed: "2024-02-01",
        applies_to: "api-gateway",
        content: "## Symptoms
- Clients receive 504 Gateway Timeout
- Upstream service slow to respond

## Steps
1. Check upstream service logs for latency.
2. Verify timeout settings in nginx/AWS ALB.
3. Increase timeout temporarily if needed.
4. Investigate if upstream is overwhelmed.",
    },
    SampleRunbook {
        title: "Disk Space Full",
        last_reviewed: "2024-01-10",
        applies_to: "all-servers",
        content: "## Symptoms
- Disk usage alerts
- Services failing to write logs

## Steps
1. Check disk usage: `df -h`
2. Find large files: `du -sh /* 2>/dev/null | sort -h`
3. Clean up old logs: `sudo logrotate -f /etc/logrotate.conf`
4. If necessary, extend the volume.",
    },
    SampleRunbook {
        title: "Service Not Starting After Reboot",
        last_reviewed: "2023-12-05",
        applies_to: "payment-service",
        content: "## Symptoms
- Service fails to start automatically after reboot
- Manual start works

## Steps
1. Check if service is enabled: `systemctl is-enabled payment-service`
2. Enable it: `sudo systemctl enable payment-service`
3. Check logs for startup errors: `journalctl -u payment-service -b`",
    },
];

/// Write the sample runbooks into `dir` as `runbook_001.md`, `runbook_002.md`, ...
pub fn seed_runbooks<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::with_capacity(SAMPLE_RUNBOOKS.len());
    for (i, rb) in SAMPLE_RUNBOOKS.iter().enumerate() {
        let path = dir.join(format!("runbook_{:03}.md", i + 1));
        let body = format!(
            "---\ntitle: {}\nlast_reviewed: {}\napplies_to: {}\n---\n\n{}",
            rb.title, rb.last_reviewed, rb.applies_to, rb.content
        );
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "created runbook");
        written.push(path);
    }
    tracing::info!(count = written.len(), "generated runbooks");
    Ok(written)
}
