use crate::infra::{parse_date, parse_policy, InMemoryAuditRepository};
use ar_audit::config::{AppConfig, AuditConfig};
use ar_audit::error::AppError;
use ar_audit::workflows::receivables::{
    format_amount, top_risks, AuditService, Collaborators, CutoffEvaluator, DashboardView,
    DocumentUpload, LedgerImporter, RiskBand, RiskFlagger, ScoreSource, ScoringPolicy,
    Transaction, TOP_RISK_LIMIT,
};
use chrono::{NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Ledger export (CSV: id,date,customer,amount,description)
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    /// Scoring policy: heuristic, model_preferred or heuristic_floor
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<ScoringPolicy>,
}

#[derive(Args, Debug)]
pub(crate) struct CutoffArgs {
    /// Invoice date (YYYY-MM-DD); omit when unknown
    #[arg(long, value_parser = parse_date)]
    pub(crate) invoice_date: Option<NaiveDate>,
    /// Delivery date (YYYY-MM-DD); omit when unknown
    #[arg(long, value_parser = parse_date)]
    pub(crate) delivery_date: Option<NaiveDate>,
    /// Fiscal year end (YYYY-MM-DD). Defaults to the configured value.
    #[arg(long, value_parser = parse_date)]
    pub(crate) fiscal_year_end: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Additional document payloads to verify (JSON extraction exports)
    #[arg(long = "document")]
    pub(crate) documents: Vec<PathBuf>,
    /// Skip drafting the executive summary.
    #[arg(long)]
    pub(crate) skip_summary: bool,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs { ledger, policy } = args;

    let mut audit = AppConfig::load()?.audit;
    if let Some(policy) = policy {
        audit.risk_policy = policy;
    }

    let transactions = LedgerImporter::from_path(&ledger)?;
    let service = offline_service(audit);
    service.load_transactions(transactions)?;
    let run = service.assess_risk()?;

    println!("Risk assessment for {}", ledger.display());
    println!(
        "- Policy {} | source {}",
        run.policy.label(),
        describe_source(&run.source)
    );
    println!(
        "- {} transactions: {} high | {} medium | {} low",
        run.bands.total(),
        run.bands.high,
        run.bands.medium,
        run.bands.low
    );
    render_top_risks(&run.transactions);

    Ok(())
}

pub(crate) fn run_cutoff(args: CutoffArgs) -> Result<(), AppError> {
    let CutoffArgs {
        invoice_date,
        delivery_date,
        fiscal_year_end,
    } = args;

    let fiscal_year_end = match fiscal_year_end {
        Some(date) => date,
        None => AppConfig::load()?.audit.fiscal_year_end,
    };
    let result = CutoffEvaluator::new(fiscal_year_end).evaluate(invoice_date, delivery_date);

    println!("Cut-off test against fiscal year end {fiscal_year_end}");
    println!("- Status: {}", result.status.label());
    println!("- Notes: {}", result.notes);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        documents,
        skip_summary,
    } = args;

    let service = offline_service(AuditConfig::default());
    println!("Receivables audit demo");

    service.load_transactions(sample_ledger())?;
    let run = service.assess_risk()?;
    println!(
        "\nScored {} sample transactions ({})",
        run.transactions.len(),
        describe_source(&run.source)
    );

    let uploaded_at = Utc::now();
    let mut uploads: Vec<DocumentUpload> = sample_documents();
    for path in documents {
        let bytes = std::fs::read(&path)?;
        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        uploads.push(DocumentUpload::new(file_name, mime_type, bytes));
    }

    println!("\nDocument verification");
    for upload in uploads {
        let document = service.verify_document(upload, uploaded_at)?;
        println!(
            "- {} [{}] {}: {}",
            document.id.0,
            document.file_name,
            document.cutoff_status().label(),
            document.notes
        );
    }

    render_dashboard(&service.dashboard()?);

    if skip_summary {
        return Ok(());
    }

    println!("\nDrafted executive summary\n");
    println!("{}", service.draft_summary()?);

    let answer = service.ask("Which documents need follow-up before sign-off?")?;
    println!("\nAssistant: {}", answer.text);

    Ok(())
}

fn offline_service(audit: AuditConfig) -> AuditService<InMemoryAuditRepository> {
    AuditService::new(
        Arc::new(InMemoryAuditRepository::default()),
        Collaborators::offline(RiskFlagger::default()),
        audit,
    )
}

fn describe_source(source: &ScoreSource) -> String {
    match source {
        ScoreSource::Heuristic => "heuristic rules".to_string(),
        ScoreSource::Model => "model scores".to_string(),
        ScoreSource::Blended => "model scores floored by heuristics".to_string(),
        ScoreSource::HeuristicFallback { error } => {
            format!("heuristic rules after model failure: {error}")
        }
    }
}

fn render_top_risks(transactions: &[Transaction]) {
    let ranked = top_risks(transactions, TOP_RISK_LIMIT);
    if ranked.is_empty() {
        println!("- No transactions flagged");
        return;
    }

    println!("Top risk factors:");
    for transaction in ranked {
        println!(
            "  - {} {} {} | {} ({}) {}",
            transaction.id,
            transaction.customer,
            format_amount(transaction.amount),
            transaction.risk_score,
            RiskBand::for_score(transaction.risk_score).label(),
            transaction.risk_reason.as_deref().unwrap_or_default()
        );
    }
}

fn render_dashboard(view: &DashboardView) {
    println!("\nDashboard");
    println!(
        "- Total analyzed: {} | high {} | medium {} | low {}",
        view.total_analyzed, view.risk_bands.high, view.risk_bands.medium, view.risk_bands.low
    );
    println!(
        "- Documents processed: {} | passed {} | failed {} | awaiting data {}",
        view.documents_processed, view.cutoff.passed, view.cutoff.failed, view.cutoff.indeterminate
    );
    for entry in &view.top_risks {
        println!(
            "  - {} {} ({})",
            entry.transaction.id, entry.transaction.risk_score, entry.band_label
        );
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

pub(crate) fn sample_ledger() -> Vec<Transaction> {
    vec![
        Transaction::new(
            "TXN-001",
            ymd(2024, 11, 15),
            "Acme Corp",
            Decimal::from(5000),
            "Consulting Services",
        ),
        Transaction::new(
            "TXN-002",
            ymd(2024, 12, 24),
            "Globex Inc",
            Decimal::from(9999),
            "Software License",
        ),
        Transaction::new(
            "TXN-003",
            ymd(2024, 12, 31),
            "Soylent Corp",
            Decimal::from(250000),
            "Bulk Purchase",
        ),
        Transaction::new(
            "TXN-004",
            ymd(2024, 12, 30),
            "Initech",
            Decimal::new(123456, 2),
            "Office Supplies",
        ),
        Transaction::new(
            "TXN-005",
            ymd(2025, 1, 2),
            "Umbrella Corp",
            Decimal::from(5000),
            "Medical Supplies",
        ),
        Transaction::new(
            "TXN-006",
            ymd(2024, 12, 25),
            "Cyberdyne",
            Decimal::from(50000),
            "R&D Hardware",
        ),
    ]
}

fn sample_documents() -> Vec<DocumentUpload> {
    let late_invoice = r#"{
        "invoiceNumber": "INV-2025-0007",
        "invoiceDate": "2025-01-03",
        "deliveryDate": "2024-12-28",
        "totalAmount": 18250.00,
        "customerName": "Soylent Corp",
        "documentType": "Invoice"
    }"#;
    let delivery_note = r#"{
        "invoiceNumber": "INV-2024-0912",
        "invoiceDate": "2024-12-18",
        "deliveryDate": "2024-12-20",
        "totalAmount": 9999.00,
        "customerName": "Globex Inc",
        "documentType": "Delivery Note"
    }"#;

    [
        ("INV-2025-0007.json", late_invoice),
        ("DN-2024-0912.json", delivery_note),
    ]
    .into_iter()
    .map(|(file_name, payload)| {
        let mime_type = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        DocumentUpload::new(file_name, mime_type, payload.as_bytes().to_vec())
    })
    .collect()
}
