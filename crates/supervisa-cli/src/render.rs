//! Plain-text rendering of command results.

use std::fmt::Write as _;

use supervisa_core::{
  reconcile::Discrepancies,
  record::SupervisionRecord,
  report::{GoalProgress, Heatmap, Metrics},
  roster::RosterSummary,
};
use supervisa_sheet::NormalizeReport;

/// Left-aligned columns separated by two spaces.
pub fn table(header: &[&str], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (i, cell) in row.iter().enumerate() {
      if let Some(w) = widths.get_mut(i) {
        *w = (*w).max(cell.chars().count());
      }
    }
  }

  let mut out = String::new();
  write_line(&mut out, header.iter().copied(), &widths);
  for row in rows {
    write_line(&mut out, row.iter().map(String::as_str), &widths);
  }
  out
}

fn write_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
  let parts: Vec<String> = cells
    .zip(widths)
    .map(|(cell, width)| {
      let pad = width.saturating_sub(cell.chars().count());
      format!("{cell}{}", " ".repeat(pad))
    })
    .collect();
  let _ = writeln!(out, "{}", parts.join("  ").trim_end());
}

pub fn records(records: &[SupervisionRecord]) -> String {
  let rows: Vec<Vec<String>> = records
    .iter()
    .map(|r| {
      vec![
        r.date.format("%Y-%m-%d").to_string(),
        r.location_code.to_string(),
        r.region.clone(),
        r.supervisor_name.clone(),
        r.supervision_status.to_string(),
        r.month_label.to_string(),
        r.inspection_kind.to_string(),
        if r.approved { "sí" } else { "no" }.to_owned(),
      ]
    })
    .collect();

  let mut out = table(
    &["Fecha", "Código", "Región", "Supervisor", "Estado", "Mes", "Tipo", "Aprobado"],
    &rows,
  );
  let _ = writeln!(out, "{} registros", records.len());
  out
}

pub fn normalize_report(report: &NormalizeReport) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{} filas leídas, {} descartadas por fecha inválida",
    report.input_rows, report.dropped_dates
  );
  for (value, count) in &report.unmapped_regions {
    let _ = writeln!(out, "  región sin mapear: {value:?} ({count})");
  }
  for (value, count) in &report.unmapped_supervisors {
    let _ = writeln!(out, "  supervisor sin mapear: {value:?} ({count})");
  }
  out
}

pub fn discrepancies(d: &Discrepancies) -> String {
  if d.is_empty() {
    return "Sin discrepancias.\n".to_owned();
  }

  let mut out = String::new();
  let list = |out: &mut String, title: &str, codes: Vec<String>| {
    let _ = writeln!(out, "{title} ({}):", codes.len());
    for code in codes {
      let _ = writeln!(out, "  {code}");
    }
  };

  list(
    &mut out,
    "En temporal pero no en la lista del cliente",
    d.unauthorized.iter().map(ToString::to_string).collect(),
  );
  list(
    &mut out,
    "En la lista del cliente pero no en temporal",
    d.missing_from_staging.iter().map(ToString::to_string).collect(),
  );
  list(
    &mut out,
    "Estado distinto",
    d.status_mismatch
      .iter()
      .map(|m| {
        format!(
          "{}: temporal {}, cliente {}",
          m.location_code, m.staging_status, m.authority_status
        )
      })
      .collect(),
  );
  out
}

pub fn metrics(m: &Metrics) -> String {
  format!(
    "Total supervisiones: {}\nFiscalizados: {}\nPrefiscalizados: {}\nFiscalizados CMC: {}\n",
    m.total, m.fiscalizado, m.prefiscalizado, m.cmc
  )
}

pub fn goal_progress(p: &GoalProgress) -> String {
  let rows: Vec<Vec<String>> = p
    .regions
    .iter()
    .chain(std::iter::once(&p.total))
    .map(|r| {
      vec![
        r.region.clone(),
        r.goal.to_string(),
        r.achieved.to_string(),
        format!("{:.2}%", r.percentage),
      ]
    })
    .collect();

  let mut out = String::new();
  let _ = writeln!(out, "Progreso de metas: {}", p.selection);
  out.push_str(&table(&["Región", "Meta", "Progreso", "Porcentaje"], &rows));
  out
}

pub fn heatmap(h: &Heatmap) -> String {
  let mut header = vec!["Región".to_owned()];
  header.extend(h.months.iter().map(ToString::to_string));

  let rows: Vec<Vec<String>> = h
    .regions
    .iter()
    .zip(&h.cells)
    .map(|(region, cells)| {
      let mut row = vec![region.clone()];
      row.extend(cells.iter().map(|p| format!("{p:.1}%")));
      row
    })
    .collect();

  let header: Vec<&str> = header.iter().map(String::as_str).collect();
  table(&header, &rows)
}

pub fn roster_summary(s: &RosterSummary) -> String {
  format!(
    "Total de locales: {}\nFiscalizados: {}\nPrefiscalizados: {}\nDisponibles: {}\n",
    s.total(),
    s.fiscalizado,
    s.prefiscalizado,
    s.disponible
  )
}
