//! Fixed remediation guidance printed after the findings.

const RECOMMENDATIONS: &str = "\
REMEDIATION RECOMMENDATIONS:

1. DATA COLLECTION & TRAINING:
   - Audit training data for racial representation and historical bias
   - Ensure balanced representation across racial groups
   - Remove features that are proxies for race (e.g., zip codes in segregated areas)
   - Include socioeconomic factors that explain behavior better than race

2. MODEL ADJUSTMENTS:
   - Implement fairness constraints during model training (e.g., equalized odds)
   - Use reweighing or adversarial debiasing techniques
   - Consider separate thresholds for different groups to achieve equal FPR/FNR
   - Regular recalibration with recent data

3. PROCESS IMPROVEMENTS:
   - Mandatory human review of all risk assessments
   - Provide judges with confidence intervals and uncertainty measures
   - Transparency: explain which factors contributed to each score
   - Allow defendants to challenge and correct factual errors in their data

4. MONITORING & ACCOUNTABILITY:
   - Continuous monitoring of disparate impact across racial groups
   - Quarterly bias audits with public reporting
   - Track downstream outcomes (bail decisions, sentencing) by race
   - Independent oversight board with community representation

5. POLICY REFORMS:
   - Limit use of risk scores to specific decisions (e.g., not for sentencing)
   - Provide right to algorithmic explanation
   - Create appeals process for those harmed by false positives
   - Consider moratorium until bias is adequately addressed
";

/// Policy recommendations for addressing biased risk scores.
pub fn remediation_recommendations() -> &'static str {
    RECOMMENDATIONS
}
