use super::milp::{Model, VarType, Values};
use good_lp::Variable;
use std::ops::Range;
use typed_index_collections::TiVec;

pub trait AddVars {
    type Out;

    /// Create a variable for any type
    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out;

    /// Binary variables
    fn binary(&self, model: &mut Model, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Binary, &(0.0..1.0))
    }

    /// A continuous non-negative variable
    fn cont(&self, model: &mut Model, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Continuous, &(0.0..f64::INFINITY))
    }
}

impl AddVars for usize {
    type Out = Vec<Variable>;

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        (0..*self)
            .map(|i| {
                model.add_var(
                    &format!("{}_{}", base_name, i),
                    vtype,
                    bounds.start,
                    bounds.end,
                )
            })
            .collect()
    }
}

impl AddVars for (usize, usize) {
    type Out = Vec<<usize as AddVars>::Out>;

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        (0..self.0)
            .map(|i| {
                self.1
                    .vars(model, &format!("{}_{}", base_name, i), vtype, bounds)
            })
            .collect()
    }
}

impl AddVars for (usize, usize, usize) {
    type Out = Vec<<(usize, usize) as AddVars>::Out>;

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        (0..self.0)
            .map(|i| {
                (self.1, self.2).vars(model, &format!("{}_{}", base_name, i), vtype, bounds)
            })
            .collect()
    }
}

/// Trait that converts model variables to their values in a solution
pub trait ConvertVars {
    type Out;
    fn convert(&self, values: &Values) -> Self::Out;
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, values: &Values) -> Self::Out {
        self.iter().map(|e| e.convert(values)).collect()
    }
}

impl<K, T: ConvertVars> ConvertVars for TiVec<K, T> {
    type Out = Vec<T::Out>;

    fn convert(&self, values: &Values) -> Self::Out {
        self.iter().map(|e| e.convert(values)).collect()
    }
}

impl<T: ConvertVars> ConvertVars for Option<T> {
    type Out = Option<T::Out>;

    fn convert(&self, values: &Values) -> Self::Out {
        self.as_ref().map(|e| e.convert(values))
    }
}

impl ConvertVars for Variable {
    type Out = f64;

    /// A variable without a value reads as zero
    fn convert(&self, values: &Values) -> Self::Out {
        values.get(self).copied().unwrap_or_default()
    }
}
