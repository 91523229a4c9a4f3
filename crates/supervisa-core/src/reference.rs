//! Reference data: the controlled vocabularies and the goal table.
//!
//! These tables are configuration: they are built once (from the built-in
//! defaults or a TOML override) and passed by reference to the normalizer and
//! the reporting functions. Nothing in this crate holds them globally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::Month};

// ─── Lookup outcome ──────────────────────────────────────────────────────────

/// How a free-text name was resolved against a vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
  /// The value was already a canonical name.
  Canonical(&'a str),
  /// The value was a known alias of this canonical name.
  Mapped(&'a str),
  /// No mapping exists; callers keep the raw value.
  Unmapped,
}

impl<'a> Resolution<'a> {
  /// The canonical name, or `raw` when unmapped.
  pub fn or_raw(self, raw: &'a str) -> &'a str {
    match self {
      Self::Canonical(s) | Self::Mapped(s) => s,
      Self::Unmapped => raw,
    }
  }

  pub fn is_unmapped(&self) -> bool { matches!(self, Self::Unmapped) }
}

// ─── ReferenceData ───────────────────────────────────────────────────────────

/// Immutable reference tables.
///
/// Every field falls back to its built-in default when absent from an
/// override file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
  /// The canonical region names, in reporting order.
  pub regions:            Vec<String>,
  /// Free-text region spelling → canonical region.
  pub region_aliases:     BTreeMap<String, String>,
  /// Free-text supervisor spelling → canonical supervisor name.
  pub supervisor_aliases: BTreeMap<String, String>,
  /// Months covered by the campaign, in reporting order.
  pub campaign_months:    Vec<Month>,
  /// Fiscalizado targets per month, one entry per region in `regions` order.
  pub goals:              BTreeMap<Month, Vec<u32>>,
}

impl ReferenceData {
  /// Check the internal consistency of the tables.
  pub fn validate(&self) -> Result<()> {
    for (month, row) in &self.goals {
      if row.len() != self.regions.len() {
        return Err(Error::GoalRowLength {
          month:    month.to_string(),
          expected: self.regions.len(),
          found:    row.len(),
        });
      }
    }
    for (alias, target) in &self.region_aliases {
      if !self.regions.iter().any(|r| r == target) {
        return Err(Error::UnknownRegion {
          alias:  alias.clone(),
          target: target.clone(),
        });
      }
    }
    Ok(())
  }

  /// Resolve a free-text region name.
  pub fn resolve_region<'a>(&'a self, raw: &str) -> Resolution<'a> {
    let key = raw.trim();
    if let Some(canonical) = self.regions.iter().find(|r| r.as_str() == key) {
      return Resolution::Canonical(canonical);
    }
    match self.region_aliases.get(key) {
      Some(target) => Resolution::Mapped(target),
      None => Resolution::Unmapped,
    }
  }

  /// Resolve a free-text supervisor name. The canonical roster is the set of
  /// alias targets.
  pub fn resolve_supervisor<'a>(&'a self, raw: &str) -> Resolution<'a> {
    let key = raw.trim();
    if let Some(target) = self.supervisor_aliases.get(key) {
      return Resolution::Mapped(target);
    }
    match self.supervisor_aliases.values().find(|v| v.as_str() == key) {
      Some(canonical) => Resolution::Canonical(canonical),
      None => Resolution::Unmapped,
    }
  }

  /// Target for `region` in `month`; 0 when either is unknown.
  pub fn goal(&self, month: Month, region: &str) -> u32 {
    let Some(idx) = self.regions.iter().position(|r| r == region) else {
      return 0;
    };
    self
      .goals
      .get(&month)
      .and_then(|row| row.get(idx))
      .copied()
      .unwrap_or(0)
  }

  /// Sum of the targets for `region` across all campaign months.
  pub fn campaign_goal(&self, region: &str) -> u32 {
    self
      .campaign_months
      .iter()
      .map(|m| self.goal(*m, region))
      .sum()
  }
}

impl Default for ReferenceData {
  fn default() -> Self {
    let regions = [
      "AISÉN DEL GRAL. CARLOS IBAÑEZ DEL CAMPO",
      "ANTOFAGASTA",
      "ARICA Y PARINACOTA",
      "ATACAMA",
      "COQUIMBO",
      "DE LA ARAUCANÍA",
      "DE LOS LAGOS",
      "DE LOS RÍOS",
      "DE ÑUBLE",
      "DEL BIOBÍO",
      "DEL LIBERTADOR GRAL. BERNARDO O´HIGGINS",
      "DEL MAULE",
      "MAGALLANES Y DE LA ANTÁRTICA CHILENA",
      "METROPOLITANA DE SANTIAGO",
      "TARAPACÁ",
      "VALPARAISO",
    ];

    let region_aliases = [
      ("Antofagasta", "ANTOFAGASTA"),
      ("Arica y Parinacota", "ARICA Y PARINACOTA"),
      ("Atacama", "ATACAMA"),
      ("Aysén", "AISÉN DEL GRAL. CARLOS IBAÑEZ DEL CAMPO"),
      ("Biobío", "DEL BIOBÍO"),
      ("Coquimbo", "COQUIMBO"),
      ("La Araucanía", "DE LA ARAUCANÍA"),
      ("Los Lagos", "DE LOS LAGOS"),
      ("Los Ríos", "DE LOS RÍOS"),
      ("Magallanes", "MAGALLANES Y DE LA ANTÁRTICA CHILENA"),
      ("Maule", "DEL MAULE"),
      ("Metropolitana", "METROPOLITANA DE SANTIAGO"),
      ("Ñuble", "DE ÑUBLE"),
      ("O'Higgins", "DEL LIBERTADOR GRAL. BERNARDO O´HIGGINS"),
      ("Tarapacá", "TARAPACÁ"),
      ("Valparaíso", "VALPARAISO"),
    ];

    let supervisor_aliases = [
      ("Alejandra Ibarra", "EUGENIA IBARRA"),
      ("Angela Vidal", "ANGELA VIDAL"),
      ("Barbara Alvarado  (EDENRED)", "BÁRBARA  ALVARADO"),
      ("Camila Lopez", "CAMILA LOPEZ"),
      ("Camila Sierra", "CAMILA SIERRA"),
      ("Catherine Espinoza", "CATHERINE  ESPINOZA"),
      ("Ceci Zapata", "CECILIA  ZAPATA CONTRERAS"),
      ("Claudia Vera", "CLAUDIA  VERA"),
      ("Claudio Vergara", "CLAUDIO VERGARA"),
      ("Daniela Sanmartin", "DANIELA SAN MARTIN"),
      ("Deissy Pinochet", "DEISSY  PINOCHET"),
      ("Diego Scheel", "DIEGO  SCHEEL"),
      ("Dominique Constenla", "DOMINIQUE CONSTENLA"),
      ("Francisca Contreras", "FRANCISCA CONTRERAS"),
      ("Ignacio Barros", "IGNACIO  BARRIOS"),
      ("Isabel Diaz", "ISABEL DIAZ"),
      ("Karen Barboza", "KAREN BARBOZA"),
      ("Kathi Olivares", "KATHERIN  OLIVARES"),
      ("Maria Jose Hermosilla", "MARIAJOSE  HERMOSILLA"),
      ("Maria Oyarzun", "MARIA  OYARZUN"),
      ("Martin Ibañez", "MARTIN  IBAÑEZ"),
      ("Melisa Marin", "MELISA  MARIN"),
      ("Nicole Aravena", "NICOLE ARAVENA"),
      ("Nicole Toledo", "NICOLE  TOLEDO"),
      ("Paulina Alvarez", "PAULINA ALVAREZ"),
      ("Sebastian Cornejo", "SEBASTIÁN IGNACIO CORNEJO LEPPE"),
      ("Sofia Aranguiz", "SOFIA  ARANGUIZ"),
      ("Tamara Ortega", "TAMARA ORTEGA"),
      ("Tania Tapia", "TANIA TAPIA ARAYA"),
      ("Tomas Guzman", "TOMÁS  GUZMÁN"),
      ("Valentia Elia", "VALENTINA  ELIA"),
      ("Veronica Cordova", "VERÓNICA CÓRDOVA"),
      ("Victoria Landeros", "VICTORIA LANDEROS"),
    ];

    let full: Vec<u32> =
      vec![9, 20, 15, 11, 31, 53, 31, 43, 36, 113, 24, 42, 10, 551, 12, 78];
    let reduced: Vec<u32> =
      vec![6, 13, 10, 7, 21, 36, 21, 29, 24, 75, 16, 28, 7, 367, 8, 52];
    let closing: Vec<u32> =
      vec![3, 7, 5, 4, 10, 18, 10, 14, 12, 38, 8, 14, 3, 184, 4, 26];

    let goals = BTreeMap::from([
      (Month::Julio, full.clone()),
      (Month::Agosto, full.clone()),
      (Month::Septiembre, reduced.clone()),
      (Month::Octubre, full),
      (Month::Noviembre, reduced),
      (Month::Diciembre, closing),
    ]);

    Self {
      regions:            regions.iter().map(|s| s.to_string()).collect(),
      region_aliases:     to_map(&region_aliases),
      supervisor_aliases: to_map(&supervisor_aliases),
      campaign_months:    vec![
        Month::Julio,
        Month::Agosto,
        Month::Septiembre,
        Month::Octubre,
        Month::Noviembre,
        Month::Diciembre,
      ],
      goals,
    }
  }
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
  pairs
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
